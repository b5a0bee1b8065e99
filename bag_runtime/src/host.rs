//! Collaborator interfaces the runtime drives but does not implement:
//! rendering, audio, movie playback and modal dialogs. Null
//! implementations keep headless runs and tests cheap; the recording
//! implementations capture call traffic for assertions.

use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;

use bag_script::{Point, Rect};

/// How a modal loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dismissal {
    Finished,
    Canceled,
}

pub trait Renderer {
    /// Draw one attached, visible object.
    fn update(&self, kind: &str, name: &str, position: Point, clip: Rect);

    /// Screen transition requested by a link (`FADE n`).
    fn transition(&self, device: &str, fade_id: i32) {
        let _ = (device, fade_id);
    }
}

pub trait AudioPlayer {
    fn play(&self, handle: &str, file: &str, volume: i32, loops: i32);
    fn stop(&self, handle: &str);
    fn is_playing(&self, handle: &str) -> bool;
}

pub trait MoviePlayer {
    fn play(&self, handle: &str, file: &str, asynch: bool);
    fn stop(&self, handle: &str);
    fn is_playing(&self, handle: &str) -> bool;
}

pub trait ModalHost {
    /// Run a modal loop until the player dismisses it.
    fn run_until_dismissed(&self, name: &str) -> Dismissal;

    /// Non-fatal user-visible message (parse alerts, missing assets).
    fn alert(&self, message: &str) {
        log::warn!("{message}");
    }
}

#[derive(Default)]
pub struct NullRenderer;

impl Renderer for NullRenderer {
    fn update(&self, _kind: &str, _name: &str, _position: Point, _clip: Rect) {}
}

#[derive(Default)]
pub struct NullAudio;

impl AudioPlayer for NullAudio {
    fn play(&self, _handle: &str, _file: &str, _volume: i32, _loops: i32) {}
    fn stop(&self, _handle: &str) {}
    fn is_playing(&self, _handle: &str) -> bool {
        false
    }
}

#[derive(Default)]
pub struct NullMovies;

impl MoviePlayer for NullMovies {
    fn play(&self, _handle: &str, _file: &str, _asynch: bool) {}
    fn stop(&self, _handle: &str) {}
    fn is_playing(&self, _handle: &str) -> bool {
        false
    }
}

#[derive(Default)]
pub struct NullModal;

impl ModalHost for NullModal {
    fn run_until_dismissed(&self, _name: &str) -> Dismissal {
        Dismissal::Finished
    }
}

/// The full collaborator set handed to a runtime at construction.
pub struct Hosts {
    pub renderer: Box<dyn Renderer>,
    pub audio: Box<dyn AudioPlayer>,
    pub movies: Box<dyn MoviePlayer>,
    pub modal: Box<dyn ModalHost>,
}

impl Default for Hosts {
    fn default() -> Self {
        Self {
            renderer: Box::new(NullRenderer),
            audio: Box::new(NullAudio),
            movies: Box::new(NullMovies),
            modal: Box::new(NullModal),
        }
    }
}

/// Recorded host event, one variant per collaborator call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostEvent {
    Update { kind: String, name: String },
    Transition { device: String, fade_id: i32 },
    SoundPlay { handle: String, file: String, volume: i32, loops: i32 },
    SoundStop { handle: String },
    MoviePlay { handle: String, file: String, asynch: bool },
    MovieStop { handle: String },
    Modal { name: String },
    Alert { message: String },
}

/// Shared event sink for the recording hosts. Clone freely; every clone
/// appends to the same log.
#[derive(Clone, Default)]
pub struct HostLog {
    events: Rc<RefCell<Vec<HostEvent>>>,
}

impl HostLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<HostEvent> {
        self.events.borrow().clone()
    }

    fn push(&self, event: HostEvent) {
        self.events.borrow_mut().push(event);
    }
}

#[derive(Clone, Default)]
pub struct RecordingRenderer {
    pub log: HostLog,
}

impl Renderer for RecordingRenderer {
    fn update(&self, kind: &str, name: &str, _position: Point, _clip: Rect) {
        self.log.push(HostEvent::Update {
            kind: kind.to_string(),
            name: name.to_string(),
        });
    }

    fn transition(&self, device: &str, fade_id: i32) {
        self.log.push(HostEvent::Transition {
            device: device.to_string(),
            fade_id,
        });
    }
}

/// Recording audio host; `set_playing` drives the "sound still playing"
/// exemption in the activation pass from tests.
#[derive(Clone, Default)]
pub struct RecordingAudio {
    pub log: HostLog,
    playing: Rc<RefCell<HashSet<String>>>,
}

impl RecordingAudio {
    pub fn set_playing(&self, handle: &str, playing: bool) {
        if playing {
            self.playing.borrow_mut().insert(handle.to_string());
        } else {
            self.playing.borrow_mut().remove(handle);
        }
    }
}

impl AudioPlayer for RecordingAudio {
    fn play(&self, handle: &str, file: &str, volume: i32, loops: i32) {
        self.playing.borrow_mut().insert(handle.to_string());
        self.log.push(HostEvent::SoundPlay {
            handle: handle.to_string(),
            file: file.to_string(),
            volume,
            loops,
        });
    }

    fn stop(&self, handle: &str) {
        self.playing.borrow_mut().remove(handle);
        self.log.push(HostEvent::SoundStop {
            handle: handle.to_string(),
        });
    }

    fn is_playing(&self, handle: &str) -> bool {
        self.playing.borrow().contains(handle)
    }
}

#[derive(Clone, Default)]
pub struct RecordingMovies {
    pub log: HostLog,
}

impl MoviePlayer for RecordingMovies {
    fn play(&self, handle: &str, file: &str, asynch: bool) {
        self.log.push(HostEvent::MoviePlay {
            handle: handle.to_string(),
            file: file.to_string(),
            asynch,
        });
    }

    fn stop(&self, handle: &str) {
        self.log.push(HostEvent::MovieStop {
            handle: handle.to_string(),
        });
    }

    fn is_playing(&self, _handle: &str) -> bool {
        false
    }
}

#[derive(Clone)]
pub struct RecordingModal {
    pub log: HostLog,
    dismissal: Dismissal,
}

impl RecordingModal {
    pub fn new(log: HostLog, dismissal: Dismissal) -> Self {
        Self { log, dismissal }
    }
}

impl Default for RecordingModal {
    fn default() -> Self {
        Self {
            log: HostLog::default(),
            dismissal: Dismissal::Finished,
        }
    }
}

impl ModalHost for RecordingModal {
    fn run_until_dismissed(&self, name: &str) -> Dismissal {
        self.log.push(HostEvent::Modal {
            name: name.to_string(),
        });
        self.dismissal
    }

    fn alert(&self, message: &str) {
        self.log.push(HostEvent::Alert {
            message: message.to_string(),
        });
    }
}

impl Hosts {
    /// A full recording host set sharing one event log.
    pub fn recording() -> (Self, HostLog, RecordingAudio) {
        let log = HostLog::new();
        let audio = RecordingAudio {
            log: log.clone(),
            ..RecordingAudio::default()
        };
        let hosts = Self {
            renderer: Box::new(RecordingRenderer { log: log.clone() }),
            audio: Box::new(audio.clone()),
            movies: Box::new(RecordingMovies { log: log.clone() }),
            modal: Box::new(RecordingModal::new(log.clone(), Dismissal::Finished)),
        };
        (hosts, log, audio)
    }
}
