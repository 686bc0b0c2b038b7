use super::{Widget, WidgetAction};
use crate::dashboard::dashboard::DashboardContext;
use eframe::egui;
use serde::{Deserialize, Serialize};

const ERROR_TEXT: &str = "Error";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalculatorKey {
    Digit(char),
    Dot,
    Op(char),
    Clear,
    Backspace,
    Equals,
}

/// Keypad calculator register. Evaluation is delegated to `exmex`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Calculator {
    expr: String,
    just_evaluated: bool,
}

impl Calculator {
    pub fn display(&self) -> &str {
        if self.expr.is_empty() {
            "0"
        } else {
            &self.expr
        }
    }

    pub fn press(&mut self, key: CalculatorKey) {
        if self.expr == ERROR_TEXT {
            self.expr.clear();
        }
        match key {
            CalculatorKey::Digit(c) if c.is_ascii_digit() => {
                if self.just_evaluated {
                    self.expr.clear();
                }
                self.expr.push(c);
            }
            CalculatorKey::Digit(_) => {}
            CalculatorKey::Dot => {
                if self.just_evaluated {
                    self.expr.clear();
                }
                let current = self
                    .expr
                    .rsplit(|c: char| "+-*/".contains(c))
                    .next()
                    .unwrap_or("");
                if !current.contains('.') {
                    if current.is_empty() {
                        self.expr.push('0');
                    }
                    self.expr.push('.');
                }
            }
            CalculatorKey::Op(op) if "+-*/".contains(op) => {
                match self.expr.chars().last() {
                    Some(last) if "+-*/".contains(last) => {
                        self.expr.pop();
                        self.expr.push(op);
                    }
                    Some(_) => self.expr.push(op),
                    None if op == '-' => self.expr.push(op),
                    None => {}
                }
            }
            CalculatorKey::Op(_) => {}
            CalculatorKey::Clear => self.expr.clear(),
            CalculatorKey::Backspace => {
                self.expr.pop();
            }
            CalculatorKey::Equals => {
                self.evaluate();
                self.just_evaluated = true;
                return;
            }
        }
        self.just_evaluated = false;
    }

    fn evaluate(&mut self) {
        if self.expr.is_empty() {
            return;
        }
        self.expr = match exmex::eval_str::<f64>(&self.expr) {
            Ok(v) if v.is_finite() => format_number(v),
            Ok(_) => ERROR_TEXT.to_string(),
            Err(e) => {
                tracing::debug!("calculator rejected '{}': {e}", self.expr);
                ERROR_TEXT.to_string()
            }
        };
    }
}

fn format_number(v: f64) -> String {
    if v.fract() == 0.0 && v.abs() < 1e15 {
        format!("{}", v as i64)
    } else {
        let s = format!("{v:.10}");
        s.trim_end_matches('0').trim_end_matches('.').to_string()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CalculatorConfig {}

pub struct CalculatorWidget {
    calc: Calculator,
}

impl CalculatorWidget {
    pub fn new(_cfg: CalculatorConfig) -> Self {
        Self {
            calc: Calculator::default(),
        }
    }
}

impl Widget for CalculatorWidget {
    fn render(&mut self, ui: &mut egui::Ui, _ctx: &DashboardContext<'_>) -> Option<WidgetAction> {
        ui.with_layout(egui::Layout::right_to_left(egui::Align::TOP), |ui| {
            ui.label(egui::RichText::new(self.calc.display()).monospace().size(20.0));
        });
        ui.separator();
        const ROWS: [[(&str, CalculatorKey); 4]; 5] = [
            [
                ("C", CalculatorKey::Clear),
                ("⌫", CalculatorKey::Backspace),
                ("/", CalculatorKey::Op('/')),
                ("*", CalculatorKey::Op('*')),
            ],
            [
                ("7", CalculatorKey::Digit('7')),
                ("8", CalculatorKey::Digit('8')),
                ("9", CalculatorKey::Digit('9')),
                ("-", CalculatorKey::Op('-')),
            ],
            [
                ("4", CalculatorKey::Digit('4')),
                ("5", CalculatorKey::Digit('5')),
                ("6", CalculatorKey::Digit('6')),
                ("+", CalculatorKey::Op('+')),
            ],
            [
                ("1", CalculatorKey::Digit('1')),
                ("2", CalculatorKey::Digit('2')),
                ("3", CalculatorKey::Digit('3')),
                ("=", CalculatorKey::Equals),
            ],
            [
                ("0", CalculatorKey::Digit('0')),
                ("00", CalculatorKey::Digit('0')),
                (".", CalculatorKey::Dot),
                ("=", CalculatorKey::Equals),
            ],
        ];
        let button_width = (ui.available_width() / 4.0 - ui.spacing().item_spacing.x).max(16.0);
        for row in ROWS {
            ui.horizontal(|ui| {
                for (label, key) in row {
                    let clicked = ui
                        .add_sized([button_width, 24.0], egui::Button::new(label))
                        .clicked();
                    if clicked {
                        self.calc.press(key);
                        if label == "00" {
                            self.calc.press(key);
                        }
                    }
                }
            });
        }
        None
    }
}
