//! Visual kinds: sprites, bitmaps, buttons, characters, things, hotspot
//! areas and the catch-all custom object for unrecognized tags.

use bag_script::{ScriptError, ScriptStream};

use crate::effect::Effect;

use super::{parse_common_field, read_header, BagObject};

/// Animated cel strip. `CELS n` declares the frame count; a single-cel
/// sprite behaves like a bitmap with a sprite renderer.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SpriteObject {
    pub cels: i32,
}

impl SpriteObject {
    pub fn is_animated(&self) -> bool {
        self.cels > 1
    }

    pub fn parse(
        &mut self,
        object: &mut BagObject,
        stream: &mut ScriptStream<'_>,
    ) -> Result<(), ScriptError> {
        let (name, payload) = read_header(stream);
        object.set_name(name);
        object.set_file_name(payload);
        self.cels = 1;
        loop {
            let token = stream.read_token();
            if token.is_empty() {
                break;
            }
            match token.as_str() {
                "CELS" => self.cels = stream.read_int()?,
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
}

/// Static image. All of its behavior is the shared contract.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BitmapObject;

impl BitmapObject {
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
            if !parse_common_field(object, &token, stream)? {
                stream.push_back(token);
                break;
            }
        }
        Ok(())
    }
}

/// Two-state clickable. Running toggles the state word between up (0)
/// and down (1); scripts gate on it through OBJ-state expressions.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ButtonObject;

impl ButtonObject {
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
                "UP" => object.set_state(0),
                "DOWN" => object.set_state(1),
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
        let next = if object.state() == 0 { 1 } else { 0 };
        object.set_state(next);
        object.set_dirty(true);
        Vec::new()
    }
}

/// Character art slot. Kept distinct from sprites so hit-testing and
/// reports can tell scenery from cast.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CharacterObject;

impl CharacterObject {
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
            if !parse_common_field(object, &token, stream)? {
                stream.push_back(token);
                break;
            }
        }
        Ok(())
    }
}

/// Inventory-style item. Floats onto the layout grid unless given a POS.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ThingObject;

impl ThingObject {
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
            if !parse_common_field(object, &token, stream)? {
                stream.push_back(token);
                break;
            }
        }
        Ok(())
    }
}

/// Invisible hotspot rectangle: `ARE name = RECT [x,y,w,h]`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AreaObject;

impl AreaObject {
    pub fn parse(
        &mut self,
        object: &mut BagObject,
        stream: &mut ScriptStream<'_>,
    ) -> Result<(), ScriptError> {
        let line = stream.line();
        let name = stream.read_token();
        object.set_name(name);
        stream.eat_white();
        if stream.peek() == Some('=') {
            stream.get();
        }
        let keyword = stream.read_token();
        if !keyword.eq_ignore_ascii_case("RECT") {
            return Err(ScriptError::MalformedLiteral {
                what: "area rect",
                line,
                found: keyword,
            });
        }
        let rect = stream.read_rect()?;
        object.set_position(rect.origin());
        object.set_size(rect.size());
        // Hotspots are hit-tested, never drawn.
        object.set_visible(false);
        Ok(())
    }
}

/// Unrecognized tag kept as an inert placeholder so one unknown statement
/// cannot poison the rest of the script.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CustomObject {
    pub tag: String,
}

impl CustomObject {
    pub fn parse(
        &mut self,
        object: &mut BagObject,
        stream: &mut ScriptStream<'_>,
    ) -> Result<(), ScriptError> {
        let (name, payload) = read_header(stream);
        object.set_name(name);
        object.set_file_name(payload);
        object.set_visible(false);
        // Resynchronize at the statement boundary.
        stream.skip_line();
        Ok(())
    }
}
