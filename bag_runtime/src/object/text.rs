//! Text objects: literal or variable-backed strings with display styling.

use bag_script::{ScriptError, ScriptStream, VariableStore};

use super::{parse_common_field, read_header, BagObject};

const DEFAULT_POINT_SIZE: i32 = 16;

/// `TXT [name] = text [VAR name] [SIZE n] [FONT n] [COLOR n]
/// [AS CAPTION|TITLE]`. A VAR clause makes the display string live: it is
/// re-read from the store every frame instead of baked at parse time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextObject {
    pub text: String,
    pub var_name: Option<String>,
    pub point_size: i32,
    pub font: i32,
    pub color: i32,
    pub caption: bool,
    pub title: bool,
}

impl Default for TextObject {
    fn default() -> Self {
        Self {
            text: String::new(),
            var_name: None,
            point_size: DEFAULT_POINT_SIZE,
            font: 0,
            color: 0,
            caption: false,
            title: false,
        }
    }
}

impl TextObject {
    pub fn parse(
        &mut self,
        object: &mut BagObject,
        stream: &mut ScriptStream<'_>,
    ) -> Result<(), ScriptError> {
        let (name, payload) = read_header(stream);
        object.set_name(name);
        self.text = payload;
        loop {
            let token = stream.read_token();
            if token.is_empty() {
                break;
            }
            match token.as_str() {
                "VAR" => {
                    let var = stream.read_token();
                    if !var.is_empty() {
                        self.var_name = Some(var);
                    }
                }
                "SIZE" => self.point_size = stream.read_int()?,
                "FONT" => self.font = stream.read_int()?,
                "COLOR" => self.color = stream.read_int()?,
                "AS" => {
                    let role = stream.read_token();
                    if role.eq_ignore_ascii_case("CAPTION") {
                        self.caption = true;
                    } else if role.eq_ignore_ascii_case("TITLE") {
                        self.title = true;
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

    /// The string drawn this frame.
    pub fn display_text(&self, vars: &VariableStore) -> String {
        if let Some(name) = &self.var_name {
            if let Some(var) = vars.get(name) {
                return var.value().to_string();
            }
        }
        self.text.clone()
    }
}
