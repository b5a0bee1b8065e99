//! Navigation links: clickable wormholes between storage devices.

use bag_script::{Point, ScriptError, ScriptStream};

use crate::effect::Effect;

use super::{parse_common_field, read_header, BagObject};

/// `LNK name = file [@[x,y]] [#[x,y]] [TO sdev] [AS LINK|CLOSEUP] [FADE n]`.
/// `@` is where the player lands in the destination, `#` where the source
/// anchor sits; neither is needed for traversal itself.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LinkObject {
    pub target: Option<String>,
    pub dest_anchor: Option<Point>,
    pub src_anchor: Option<Point>,
    pub closeup: bool,
    pub fade_id: Option<i32>,
}

impl LinkObject {
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
            if let Some(rest) = token.strip_prefix('@') {
                self.dest_anchor = bag_script::stream::parse_point_token(rest).or(self.dest_anchor);
                continue;
            }
            if let Some(rest) = token.strip_prefix('#') {
                self.src_anchor = bag_script::stream::parse_point_token(rest).or(self.src_anchor);
                continue;
            }
            match token.as_str() {
                "TO" => {
                    let target = stream.read_token();
                    if !target.is_empty() {
                        self.target = Some(target);
                    }
                }
                "AS" => {
                    let role = stream.read_token();
                    self.closeup = role.eq_ignore_ascii_case("CLOSEUP");
                }
                "FADE" => self.fade_id = Some(stream.read_int()?),
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

    /// Traversal. A link without a TO clause is inert.
    pub fn run(&mut self) -> Vec<Effect> {
        let target = self.target.clone().unwrap_or_default();
        if target.is_empty() {
            return Vec::new();
        }
        vec![Effect::Navigate {
            target,
            fade_id: self.fade_id,
            closeup: self.closeup,
        }]
    }
}
