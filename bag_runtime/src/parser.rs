//! The world script parser. A world is one `{ ... }` block of statements;
//! each statement is an optional SET/HOLD/RUN modifier, a tag, and the
//! tag's field grammar. IF/ELSE/ENDIF nesting builds the expression arena
//! and every object declared inside a block inherits the block's gate.
//!
//! Parsing is deliberately forgiving: a malformed statement lands in the
//! report and the parser resynchronizes at the next line, because one bad
//! statement must not take a whole scene down.

use bag_script::{evaluate, Expression, ScriptStream, Size, VariableStore};
use log::debug;
use serde::Serialize;

use crate::object::visual::CustomObject;
use crate::object::{BagObject, ObjectKind, ParseCtx};
use crate::storage::StorageDevice;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParseWarning {
    pub line: usize,
    pub message: String,
}

impl ParseWarning {
    pub fn new(line: usize, message: impl Into<String>) -> Self {
        Self {
            line,
            message: message.into(),
        }
    }
}

/// Outcome of one world parse. Errors are structural (unmatched IF,
/// missing braces); warnings are statements that were skipped or defaulted.
#[derive(Debug, Default, Serialize)]
pub struct ParseReport {
    pub device: String,
    pub objects: usize,
    pub expressions: usize,
    pub warnings: Vec<ParseWarning>,
    pub errors: Vec<ParseWarning>,
}

impl ParseReport {
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty() && self.errors.is_empty()
    }
}

/// Hook for application-defined tags. Returning `None` falls back to an
/// inert custom object plus a warning.
pub type UserObjectFactory<'f> = dyn Fn(&str) -> Option<BagObject> + 'f;

/// Statement modifier, controlling locality and immediate execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Modifier {
    Set,
    Hold,
    Run,
}

pub fn parse_world(
    device: &mut StorageDevice,
    stream: &mut ScriptStream<'_>,
    vars: &mut VariableStore,
) -> ParseReport {
    parse_world_with(device, stream, vars, &|_| None)
}

pub fn parse_world_with(
    device: &mut StorageDevice,
    stream: &mut ScriptStream<'_>,
    vars: &mut VariableStore,
    user_factory: &UserObjectFactory<'_>,
) -> ParseReport {
    let mut report = ParseReport {
        device: device.name().to_string(),
        ..ParseReport::default()
    };
    let mut warnings: Vec<ParseWarning> = Vec::new();
    // (expression id, currently in the ELSE branch)
    let mut else_stack: Vec<(usize, bool)> = Vec::new();
    let mut closed = false;

    stream.eat_white();
    if stream.peek() == Some('{') {
        stream.get();
    } else {
        warnings.push(ParseWarning::new(stream.line(), "world block does not open with '{'"));
    }

    loop {
        stream.eat_white();
        match stream.peek() {
            None => break,
            Some('}') => {
                stream.get();
                closed = true;
                break;
            }
            Some(';') => {
                stream.get();
                continue;
            }
            _ => {}
        }

        let first = stream.read_token();
        if first.is_empty() {
            // Not a token and not a brace: drop the stray character.
            stream.get();
            continue;
        }
        if first == "REM" || first.starts_with("//") {
            stream.skip_line();
            continue;
        }

        let (modifier, tag) = match first.as_str() {
            "SET" => (Modifier::Set, stream.read_token()),
            "HOLD" => (Modifier::Hold, stream.read_token()),
            "RUN" => (Modifier::Run, stream.read_token()),
            _ => (Modifier::Run, first),
        };

        match tag.as_str() {
            "BKG" => {
                stream.eat_white();
                if stream.peek() == Some('=') {
                    stream.get();
                }
                device.set_background(stream.read_quoted_or_word());
                if stream.peek_token() == "SIZE" {
                    let _ = stream.read_token();
                    match stream.read_point() {
                        Ok(pair) => device.set_background_size(Size::new(pair.x, pair.y)),
                        Err(err) => {
                            warnings.push(ParseWarning::new(stream.line(), err.to_string()));
                            stream.skip_line();
                        }
                    }
                }
                stream.eat_terminator();
            }
            "DISKID" => {
                stream.eat_white();
                if stream.peek() == Some('=') {
                    stream.get();
                }
                match stream.read_int() {
                    Ok(id) => device.set_disk_id(id),
                    Err(err) => {
                        warnings.push(ParseWarning::new(stream.line(), err.to_string()));
                        stream.skip_line();
                    }
                }
                stream.eat_terminator();
            }
            "HELP" => {
                stream.eat_white();
                if stream.peek() == Some('=') {
                    stream.get();
                }
                device.set_help_file(stream.read_quoted_or_word());
                stream.eat_terminator();
            }
            "CLOSEUP" => {
                device.set_closeup(true);
                stream.eat_terminator();
            }
            "CIC" => {
                device.set_closeup(true);
                device.set_cic(true);
                stream.eat_terminator();
            }
            "IF" => {
                let (parent, prev_negative) = match else_stack.last() {
                    Some(&(id, negated)) => (Some(id), negated),
                    None => (None, false),
                };
                match Expression::parse(stream, parent, prev_negative) {
                    Ok(expression) => {
                        device.expressions.push(expression);
                        else_stack.push((device.expressions.len() - 1, false));
                    }
                    Err(err) => {
                        warnings.push(ParseWarning::new(stream.line(), err.to_string()));
                        stream.skip_line();
                    }
                }
            }
            "ELSE" => match else_stack.last_mut() {
                Some((_, negated)) => *negated = !*negated,
                None => {
                    report
                        .errors
                        .push(ParseWarning::new(stream.line(), "ELSE without a matching IF"));
                }
            },
            "ENDIF" => {
                if else_stack.pop().is_none() {
                    report
                        .errors
                        .push(ParseWarning::new(stream.line(), "ENDIF without a matching IF"));
                }
            }
            _ => {
                let line = stream.line();
                let mut object = match BagObject::from_tag(&tag) {
                    Some(object) => object,
                    None => match user_factory(&tag) {
                        Some(object) => object,
                        None => {
                            warnings.push(ParseWarning::new(
                                line,
                                format!("unknown tag '{tag}', kept as custom object"),
                            ));
                            let mut custom = BagObject::new(ObjectKind::Custom(CustomObject {
                                tag: tag.clone(),
                            }));
                            custom.set_visible(false);
                            custom
                        }
                    },
                };

                let parse_result = {
                    let mut ctx = ParseCtx {
                        vars,
                        expressions: &mut device.expressions,
                        warnings: &mut warnings,
                    };
                    object.parse_fields(stream, &mut ctx)
                };
                if let Err(err) = parse_result {
                    warnings.push(ParseWarning::new(line, err.to_string()));
                    stream.skip_line();
                    continue;
                }

                // SET attaches like anything else but never auto-runs.
                // HOLD sits outside the pass entirely; it keeps the
                // immediate-run flag so a later activation fires the
                // action on the pass after it attaches.
                match modifier {
                    Modifier::Set => {
                        object.set_local(true);
                        object.set_immediate_run(false);
                    }
                    Modifier::Hold => {
                        object.set_local(false);
                        object.set_immediate_run(true);
                    }
                    Modifier::Run => {
                        object.set_local(true);
                        object.set_immediate_run(true);
                    }
                }

                if let Some(&(gate, negated)) = else_stack.last() {
                    object.set_expression(Some(gate));
                    object.set_negative(negated);
                }

                // Local objects take their initial active flag from the
                // gate, evaluated against the store as it stands now.
                if object.is_local() {
                    let active = match object.expression() {
                        Some(id) => {
                            evaluate(&device.expressions, id, vars, object.is_negative())
                        }
                        None => true,
                    };
                    object.set_active(active);
                }

                if object.is_modal() {
                    device.set_contains_modal(true);
                }

                debug!(
                    "{}: parsed {} '{}'",
                    device.name(),
                    object.kind.tag(),
                    object.name()
                );
                device.add_object(object);
            }
        }
    }

    if !closed {
        report
            .errors
            .push(ParseWarning::new(stream.line(), "world block never closed with '}'"));
    }
    for _ in &else_stack {
        report
            .errors
            .push(ParseWarning::new(stream.line(), "IF without a matching ENDIF"));
    }

    report.objects = device.object_count();
    report.expressions = device.expressions.len();
    report.warnings = warnings;
    report
}
