//! Evidence kinds: residue prints and the dossiers they unlock.

use bag_script::{ScriptError, ScriptStream, VariableStore};

use crate::effect::Effect;

use super::{parse_common_field, read_header, BagObject};

/// States shared by the evidence kinds through the object state word.
pub const EVIDENCE_UNTOUCHED: i32 = 0;
pub const EVIDENCE_REVIEWED: i32 = 1;

/// `RPO name = file [TOUCHED VAR name] [DOS name]*`. Running a residue
/// print whose touched-variable reads non-zero inserts its dossier objects
/// into the owning device and flags the print reviewed.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ResiduePrintObject {
    pub touched_var: Option<String>,
    pub dossiers: Vec<String>,
}

impl ResiduePrintObject {
    pub fn parse(
        &mut self,
        object: &mut BagObject,
        stream: &mut ScriptStream<'_>,
    ) -> Result<(), ScriptError> {
        let (name, payload) = read_header(stream);
        object.set_name(name);
        object.set_file_name(payload);
        loop {
            let token = stream.read_token();
            if token.is_empty() {
                break;
            }
            match token.as_str() {
                "TOUCHED" => {
                    let keyword = stream.read_token();
                    if keyword.eq_ignore_ascii_case("VAR") {
                        let var = stream.read_token();
                        if !var.is_empty() {
                            self.touched_var = Some(var);
                        }
                    } else {
                        stream.push_back(keyword);
                    }
                }
                "DOS" => {
                    let dossier = stream.read_token();
                    if !dossier.is_empty() {
                        self.dossiers.push(dossier);
                    }
                }
                _ => {
                    if !parse_common_field(object, &token, stream)? {
                        stream.push_back(token);
                        break;
                    }
                }
            }
        }
        Ok(())
    }

    pub fn run(
        &mut self,
        object: &mut BagObject,
        device: &str,
        vars: &VariableStore,
    ) -> Vec<Effect> {
        let touched = self
            .touched_var
            .as_deref()
            .and_then(|name| vars.num_value(name))
            .unwrap_or(0);
        if touched == 0 {
            return Vec::new();
        }
        object.set_state(EVIDENCE_REVIEWED);
        object.set_dirty(true);
        self.dossiers
            .iter()
            .map(|dossier| Effect::AddObject {
                dst: device.to_string(),
                object: dossier.clone(),
            })
            .collect()
    }
}

/// `DOS name = file [SUSPECT VAR name]`. Reading the dossier writes `1`
/// into its suspect variable so later conditions can gate on it.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DossierObject {
    pub suspect_var: Option<String>,
}

impl DossierObject {
    pub fn parse(
        &mut self,
        object: &mut BagObject,
        stream: &mut ScriptStream<'_>,
    ) -> Result<(), ScriptError> {
        let (name, payload) = read_header(stream);
        object.set_name(name);
        object.set_file_name(payload);
        loop {
            let token = stream.read_token();
            if token.is_empty() {
                break;
            }
            match token.as_str() {
                "SUSPECT" => {
                    let keyword = stream.read_token();
                    if keyword.eq_ignore_ascii_case("VAR") {
                        let var = stream.read_token();
                        if !var.is_empty() {
                            self.suspect_var = Some(var);
                        }
                    } else {
                        stream.push_back(keyword);
                    }
                }
                _ => {
                    if !parse_common_field(object, &token, stream)? {
                        stream.push_back(token);
                        break;
                    }
                }
            }
        }
        Ok(())
    }

    pub fn run(&mut self, object: &mut BagObject) -> Vec<Effect> {
        object.set_state(EVIDENCE_REVIEWED);
        object.set_dirty(true);
        match &self.suspect_var {
            Some(var) => vec![Effect::SetVariable {
                name: var.clone(),
                value: "1".to_string(),
            }],
            None => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::object::{ObjectKind, ParseCtx};

    use super::*;

    fn parse_object(tag: &str, body: &str) -> BagObject {
        let mut object = BagObject::from_tag(tag).expect("known tag");
        let mut stream = ScriptStream::new(body);
        let mut vars = VariableStore::new();
        let mut expressions = Vec::new();
        let mut warnings = Vec::new();
        let mut ctx = ParseCtx {
            vars: &mut vars,
            expressions: &mut expressions,
            warnings: &mut warnings,
        };
        object
            .parse_fields(&mut stream, &mut ctx)
            .expect("parse fields");
        object
    }

    #[test]
    fn untouched_print_stays_inert() {
        let mut object =
            parse_object("RPO", "PRINT1 = PRINT1.BMP TOUCHED VAR P1TOUCH DOS DEVEN DOS PUSHER;");
        let mut vars = VariableStore::with_seed(1);
        vars.set_or_add("P1TOUCH", "0").expect("writable");
        assert!(object.run("VIDKIOSK", &vars).is_empty());
        assert_eq!(object.state(), EVIDENCE_UNTOUCHED);
    }

    #[test]
    fn touched_print_inserts_its_dossiers_and_marks_reviewed() {
        let mut object =
            parse_object("RPO", "PRINT1 = PRINT1.BMP TOUCHED VAR P1TOUCH DOS DEVEN DOS PUSHER;");
        let mut vars = VariableStore::with_seed(1);
        vars.set_or_add("P1TOUCH", "1").expect("writable");
        let effects = object.run("VIDKIOSK", &vars);
        assert_eq!(
            effects,
            vec![
                Effect::AddObject {
                    dst: "VIDKIOSK".to_string(),
                    object: "DEVEN".to_string(),
                },
                Effect::AddObject {
                    dst: "VIDKIOSK".to_string(),
                    object: "PUSHER".to_string(),
                },
            ]
        );
        assert_eq!(object.state(), EVIDENCE_REVIEWED);
    }

    #[test]
    fn dossier_run_writes_its_suspect_variable() {
        let mut object = parse_object("DOS", "DEVEN = DEVEN.TXT SUSPECT VAR DEVENSEEN;");
        match &object.kind {
            ObjectKind::Dossier(dossier) => {
                assert_eq!(dossier.suspect_var.as_deref(), Some("DEVENSEEN"));
            }
            other => panic!("unexpected kind {other:?}"),
        }
        let vars = VariableStore::new();
        let effects = object.run("VIDKIOSK", &vars);
        assert_eq!(
            effects,
            vec![Effect::SetVariable {
                name: "DEVENSEEN".to_string(),
                value: "1".to_string(),
            }]
        );
        assert_eq!(object.state(), EVIDENCE_REVIEWED);
    }
}
