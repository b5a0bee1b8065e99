//! Media kinds: sounds and movies. Neither touches a decoder here; running
//! one emits a playback effect and the host collaborators do the rest.

use bag_script::{ScriptError, ScriptStream};

use crate::effect::Effect;

use super::{parse_common_field, read_header, BagObject};

const DEFAULT_VOLUME: i32 = 10;

/// `SND name = file [VOL n] [LOOP n] [AS WAIT|ASYNCH]`. A sound's handle
/// is its object name; the activation pass will not tear a sound down
/// while the audio host still reports that handle as playing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SoundObject {
    pub volume: i32,
    pub loops: i32,
    pub asynch: bool,
}

impl Default for SoundObject {
    fn default() -> Self {
        Self {
            volume: DEFAULT_VOLUME,
            loops: 1,
            asynch: false,
        }
    }
}

impl SoundObject {
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
                "VOL" => self.volume = stream.read_int()?,
                "LOOP" => self.loops = stream.read_int()?,
                "AS" => {
                    let mode = stream.read_token();
                    if mode.eq_ignore_ascii_case("ASYNCH") {
                        self.asynch = true;
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
        // Sounds have no screen presence.
        object.set_visible(false);
        Ok(())
    }

    pub fn run(&mut self, name: &str, file: &str) -> Vec<Effect> {
        vec![Effect::PlaySound {
            handle: name.to_string(),
            file: file.to_string(),
            volume: self.volume,
            loops: self.loops,
        }]
    }
}

/// `MOVIE name = file [AS MOVIE|PDAMSG] [ASYNCH]`. A PDAMSG movie routes
/// through the PDA: running it raises the owning object's message light
/// and playback waits for the player to open the message.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MovieObject {
    pub asynch: bool,
    pub pda_msg: bool,
}

impl MovieObject {
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
                "ASYNCH" => self.asynch = true,
                "AS" => {
                    let mode = stream.read_token();
                    if mode.eq_ignore_ascii_case("PDAMSG") {
                        self.pda_msg = true;
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
        object.set_visible(false);
        Ok(())
    }

    pub fn run(&mut self, object: &mut BagObject, name: &str, file: &str) -> Vec<Effect> {
        if self.pda_msg {
            object.set_msg_waiting(true);
            return Vec::new();
        }
        vec![Effect::PlayMovie {
            handle: name.to_string(),
            file: file.to_string(),
            asynch: self.asynch,
        }]
    }
}
