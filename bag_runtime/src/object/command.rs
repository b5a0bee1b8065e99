//! Command objects: script-level verbs over the object and device graph.

use bag_script::{ScriptError, ScriptStream};

use crate::effect::Effect;
use crate::pda::PdaMode;

use super::{read_header, BagObject, ParseCtx};

/// Opcodes are matched by exact string. An unrecognized opcode parses to
/// an inert command (and a report warning) rather than failing the world.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandOpcode {
    /// Activate OBJECT in the TO device.
    Insert,
    /// Deactivate OBJECT in the FROM device.
    Remove,
    /// Move OBJECT from FROM to TO with rollback.
    Transfer,
    /// Close the current device.
    Close,
    /// Hand control to the modal host.
    EventLoop,
    /// Surface the PDA in the named mode (default map).
    ShowPda,
    HidePda,
    /// Suspend the current PDA mode for an overlay, and bring it back.
    HoldPda,
    RestorePda,
    /// Player death: the runtime raises the DEATH variable and the
    /// application shell takes it from there.
    Death,
}

impl CommandOpcode {
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "INSERT" => Some(Self::Insert),
            "REMOVE" => Some(Self::Remove),
            "TRANSFER" => Some(Self::Transfer),
            "CLOSE" => Some(Self::Close),
            "EVENTLOOP" => Some(Self::EventLoop),
            "SHOWPDA" => Some(Self::ShowPda),
            "HIDEPDA" => Some(Self::HidePda),
            "HOLDPDA" => Some(Self::HoldPda),
            "RESTOREPDA" => Some(Self::RestorePda),
            "DEATH" => Some(Self::Death),
            _ => None,
        }
    }
}

/// `COMMAND [name] = OPCODE [OBJECT name] [FROM sdev] [TO sdev]`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CommandObject {
    pub opcode: Option<CommandOpcode>,
    pub object: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
    pub pda_mode: PdaMode,
}

impl CommandObject {
    pub fn parse(
        &mut self,
        object: &mut BagObject,
        stream: &mut ScriptStream<'_>,
        ctx: &mut ParseCtx<'_>,
    ) -> Result<(), ScriptError> {
        let line = stream.line();
        let (name, payload) = read_header(stream);
        object.set_name(name);
        self.opcode = CommandOpcode::from_token(&payload);
        if self.opcode.is_none() {
            ctx.warnings.push(crate::parser::ParseWarning::new(
                line,
                format!("unknown command opcode '{payload}'"),
            ));
        }
        loop {
            let token = stream.read_token();
            if token.is_empty() {
                break;
            }
            match token.as_str() {
                "OBJECT" => {
                    let target = stream.read_token();
                    if !target.is_empty() {
                        self.object = Some(target);
                    }
                }
                "FROM" => {
                    let device = stream.read_token();
                    if !device.is_empty() {
                        self.from = Some(device);
                    }
                }
                "TO" => {
                    let device = stream.read_token();
                    if !device.is_empty() {
                        self.to = Some(device);
                    }
                }
                "MAP" => self.pda_mode = PdaMode::Map,
                "INVENTORY" => self.pda_mode = PdaMode::Inventory,
                "LOG" => self.pda_mode = PdaMode::Log,
                _ => {
                    stream.push_back(token);
                    break;
                }
            }
        }
        object.set_visible(false);
        Ok(())
    }

    /// `device` is the device the command lives in; FROM/TO default to it
    /// so single-device commands stay terse in scripts.
    pub fn run(&mut self, device: &str) -> Vec<Effect> {
        let opcode = match self.opcode {
            Some(opcode) => opcode,
            None => return Vec::new(),
        };
        let object = self.object.clone().unwrap_or_default();
        let from = self.from.clone().unwrap_or_else(|| device.to_string());
        let to = self.to.clone().unwrap_or_else(|| device.to_string());
        match opcode {
            CommandOpcode::Insert => vec![Effect::AddObject { dst: to, object }],
            CommandOpcode::Remove => vec![Effect::RemoveObject { src: from, object }],
            CommandOpcode::Transfer => vec![Effect::MoveObject {
                dst: to,
                src: from,
                object,
            }],
            CommandOpcode::Close => vec![Effect::CloseDevice],
            CommandOpcode::EventLoop => vec![Effect::EventLoop { name: object }],
            CommandOpcode::ShowPda => {
                let mode = if self.pda_mode == PdaMode::None {
                    PdaMode::Map
                } else {
                    self.pda_mode
                };
                vec![Effect::ShowPda { mode }]
            }
            CommandOpcode::HidePda => vec![Effect::HidePda],
            CommandOpcode::HoldPda => vec![Effect::HoldPda],
            CommandOpcode::RestorePda => vec![Effect::RestorePda],
            CommandOpcode::Death => vec![Effect::SetVariable {
                name: "DEATH".to_string(),
                value: "1".to_string(),
            }],
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::object::ObjectKind;

    use super::*;

    fn parse_command(body: &str) -> (BagObject, Vec<crate::parser::ParseWarning>) {
        let mut object = BagObject::from_tag("COMMAND").expect("known tag");
        let mut stream = ScriptStream::new(body);
        let mut vars = bag_script::VariableStore::new();
        let mut expressions = Vec::new();
        let mut warnings = Vec::new();
        {
            let mut ctx = ParseCtx {
                vars: &mut vars,
                expressions: &mut expressions,
                warnings: &mut warnings,
            };
            object
                .parse_fields(&mut stream, &mut ctx)
                .expect("parse fields");
        }
        (object, warnings)
    }

    #[test]
    fn transfer_defaults_missing_clauses_to_the_owning_device() {
        let (mut object, warnings) = parse_command("GIVE = TRANSFER OBJECT BOTTLE TO PLAYER;");
        assert!(warnings.is_empty());
        let vars = bag_script::VariableStore::new();
        let effects = object.run("BAR", &vars);
        assert_eq!(
            effects,
            vec![Effect::MoveObject {
                dst: "PLAYER".to_string(),
                src: "BAR".to_string(),
                object: "BOTTLE".to_string(),
            }]
        );
    }

    #[test]
    fn showpda_carries_the_requested_mode() {
        let (mut object, _) = parse_command("= SHOWPDA LOG;");
        let vars = bag_script::VariableStore::new();
        assert_eq!(
            object.run("BAR", &vars),
            vec![Effect::ShowPda { mode: PdaMode::Log }]
        );
    }

    #[test]
    fn unknown_opcode_is_inert_and_warned() {
        let (mut object, warnings) = parse_command("ODD = FROBNICATE;");
        assert_eq!(warnings.len(), 1);
        match &object.kind {
            ObjectKind::Command(command) => assert!(command.opcode.is_none()),
            other => panic!("unexpected kind {other:?}"),
        }
        let vars = bag_script::VariableStore::new();
        assert!(object.run("BAR", &vars).is_empty());
    }
}
