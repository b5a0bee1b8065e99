//! The polymorphic object model: one shared activation/visibility
//! contract (`BagObject`) over a closed set of scriptable kinds. The kind
//! enum is the single dispatch point for field parsing, action running and
//! rendering, so every behavioral difference between kinds lives here and
//! nowhere else.

pub mod command;
pub mod link;
pub mod media;
pub mod puzzle;
pub mod script_objs;
pub mod text;
pub mod visual;

use bag_script::{ExprId, Expression, Point, Rect, ScriptError, ScriptStream, Size, VariableStore};

use crate::effect::Effect;
use crate::host::Renderer;
use crate::parser::ParseWarning;

pub use command::{CommandObject, CommandOpcode};
pub use link::LinkObject;
pub use media::{MovieObject, SoundObject};
pub use puzzle::{DossierObject, ResiduePrintObject};
pub use script_objs::{ExpressionObject, VariableDeclObject};
pub use text::TextObject;
pub use visual::{
    AreaObject, BitmapObject, ButtonObject, CharacterObject, CustomObject, SpriteObject,
    ThingObject,
};

/// Everything a per-kind field parser may touch: the variable store (VAR
/// declarations land there at parse time), the owning device's expression
/// arena (EXPR objects) and the parse report's warning list.
pub struct ParseCtx<'a> {
    pub vars: &'a mut VariableStore,
    pub expressions: &'a mut Vec<Expression>,
    pub warnings: &'a mut Vec<ParseWarning>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ObjectKind {
    Sprite(SpriteObject),
    Bitmap(BitmapObject),
    Link(LinkObject),
    Text(TextObject),
    Sound(SoundObject),
    Movie(MovieObject),
    Command(CommandObject),
    VariableDecl(VariableDeclObject),
    Expression(ExpressionObject),
    ResiduePrint(ResiduePrintObject),
    Dossier(DossierObject),
    Button(ButtonObject),
    Character(CharacterObject),
    Thing(ThingObject),
    Area(AreaObject),
    Custom(CustomObject),
}

impl ObjectKind {
    /// Script/tag spelling of the kind, used by save records and reports.
    pub fn tag(&self) -> &'static str {
        match self {
            ObjectKind::Sprite(_) => "SPR",
            ObjectKind::Bitmap(_) => "BMP",
            ObjectKind::Link(_) => "LNK",
            ObjectKind::Text(_) => "TXT",
            ObjectKind::Sound(_) => "SND",
            ObjectKind::Movie(_) => "MOVIE",
            ObjectKind::Command(_) => "COMMAND",
            ObjectKind::VariableDecl(_) => "VAR",
            ObjectKind::Expression(_) => "EXPR",
            ObjectKind::ResiduePrint(_) => "RPO",
            ObjectKind::Dossier(_) => "DOS",
            ObjectKind::Button(_) => "BUT",
            ObjectKind::Character(_) => "CHR",
            ObjectKind::Thing(_) => "TNG",
            ObjectKind::Area(_) => "ARE",
            ObjectKind::Custom(_) => "USER",
        }
    }

    pub fn is_sound(&self) -> bool {
        matches!(self, ObjectKind::Sound(_))
    }

    pub fn is_link(&self) -> bool {
        matches!(self, ObjectKind::Link(_))
    }
}

/// The unit of scripted behavior. Flags follow the activation contract:
/// `attached` implies the object was constructed into the live scene via
/// `attach` and has not since been detached; nothing is drawn or hit-tested
/// while `attached` is false.
#[derive(Debug, Clone, PartialEq)]
pub struct BagObject {
    name: String,
    file_name: String,
    position: Option<Point>,
    size: Size,
    state: i32,
    expression: Option<ExprId>,
    float_page: usize,
    visible: bool,
    active: bool,
    local: bool,
    attached: bool,
    immediate_run: bool,
    pending_run: bool,
    negative: bool,
    modal: bool,
    dirty: bool,
    msg_waiting: bool,
    pub kind: ObjectKind,
}

impl BagObject {
    pub fn new(kind: ObjectKind) -> Self {
        Self {
            name: String::new(),
            file_name: String::new(),
            position: None,
            size: Size::default(),
            state: 0,
            expression: None,
            float_page: 0,
            visible: true,
            active: false,
            local: false,
            attached: false,
            immediate_run: false,
            pending_run: false,
            negative: false,
            modal: false,
            dirty: true,
            msg_waiting: false,
            kind,
        }
    }

    /// Construct the kind matching a script tag; `None` hands the tag to
    /// the user-object factory.
    pub fn from_tag(tag: &str) -> Option<Self> {
        let kind = match tag {
            "SPR" => ObjectKind::Sprite(SpriteObject::default()),
            "BMP" => ObjectKind::Bitmap(BitmapObject::default()),
            "LNK" => ObjectKind::Link(LinkObject::default()),
            "TXT" => ObjectKind::Text(TextObject::default()),
            "SND" => ObjectKind::Sound(SoundObject::default()),
            "MOVIE" => ObjectKind::Movie(MovieObject::default()),
            "COMMAND" => ObjectKind::Command(CommandObject::default()),
            "VAR" => ObjectKind::VariableDecl(VariableDeclObject::default()),
            "EXPR" => ObjectKind::Expression(ExpressionObject::default()),
            "RPO" => ObjectKind::ResiduePrint(ResiduePrintObject::default()),
            "DOS" => ObjectKind::Dossier(DossierObject::default()),
            "BUT" => ObjectKind::Button(ButtonObject::default()),
            "CHR" => ObjectKind::Character(CharacterObject::default()),
            "TNG" => ObjectKind::Thing(ThingObject::default()),
            "ARE" => ObjectKind::Area(AreaObject::default()),
            // Energy detectors have no runtime behavior here; the tag is
            // recognized so scripts carrying them parse warning-free.
            "EDO" => ObjectKind::Custom(CustomObject {
                tag: "EDO".to_string(),
            }),
            _ => return None,
        };
        Some(Self::new(kind))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn set_file_name(&mut self, file: impl Into<String>) {
        self.file_name = file.into();
    }

    /// Objects without a literal position are floating: the activation
    /// pass places them through the auto-layout rule.
    pub fn is_floating(&self) -> bool {
        self.position.is_none()
    }

    pub fn position(&self) -> Option<Point> {
        self.position
    }

    pub fn set_position(&mut self, position: Point) {
        self.position = Some(position);
    }

    pub fn clear_position(&mut self) {
        self.position = None;
    }

    pub fn size(&self) -> Size {
        self.size
    }

    pub fn set_size(&mut self, size: Size) {
        self.size = size;
    }

    pub fn rect(&self) -> Rect {
        Rect::from_point_size(self.position.unwrap_or_default(), self.size)
    }

    pub fn is_inside(&self, point: Point) -> bool {
        self.position.is_some() && self.rect().contains(point)
    }

    pub fn state(&self) -> i32 {
        self.state
    }

    pub fn set_state(&mut self, state: i32) {
        self.state = state;
    }

    pub fn expression(&self) -> Option<ExprId> {
        self.expression
    }

    pub fn set_expression(&mut self, expr: Option<ExprId>) {
        self.expression = expr;
    }

    pub fn float_page(&self) -> usize {
        self.float_page
    }

    pub fn set_float_page(&mut self, page: usize) {
        self.float_page = page;
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn set_active(&mut self, active: bool) {
        self.active = active;
    }

    pub fn is_local(&self) -> bool {
        self.local
    }

    pub fn set_local(&mut self, local: bool) {
        self.local = local;
    }

    pub fn is_attached(&self) -> bool {
        self.attached
    }

    pub fn is_immediate_run(&self) -> bool {
        self.immediate_run
    }

    pub fn set_immediate_run(&mut self, immediate: bool) {
        self.immediate_run = immediate;
    }

    /// An immediate action deferred past the device's first paint.
    pub fn is_pending_run(&self) -> bool {
        self.pending_run
    }

    pub fn set_pending_run(&mut self, pending: bool) {
        self.pending_run = pending;
    }

    pub fn is_negative(&self) -> bool {
        self.negative
    }

    pub fn set_negative(&mut self, negative: bool) {
        self.negative = negative;
    }

    pub fn is_modal(&self) -> bool {
        self.modal
    }

    pub fn set_modal(&mut self, modal: bool) {
        self.modal = modal;
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn set_dirty(&mut self, dirty: bool) {
        self.dirty = dirty;
    }

    pub fn is_msg_waiting(&self) -> bool {
        self.msg_waiting
    }

    pub fn set_msg_waiting(&mut self, waiting: bool) {
        self.msg_waiting = waiting;
    }

    /// Acquire the object's runtime resources. Bookkeeping only; host
    /// notifications (sound start/stop) ride on run/detach effects.
    pub fn attach(&mut self) {
        self.attached = true;
        self.dirty = true;
    }

    pub fn detach(&mut self) {
        self.attached = false;
        self.pending_run = false;
        self.dirty = true;
    }

    /// Host traffic owed when this object is torn down (a playing sound is
    /// stopped, an async movie is cut).
    pub fn detach_effects(&self) -> Vec<Effect> {
        match &self.kind {
            ObjectKind::Sound(_) => vec![Effect::StopSound {
                handle: self.name.clone(),
            }],
            _ => Vec::new(),
        }
    }

    /// Per-kind field grammar, fed the stream right after the tag token.
    pub fn parse_fields(
        &mut self,
        stream: &mut ScriptStream<'_>,
        ctx: &mut ParseCtx<'_>,
    ) -> Result<(), ScriptError> {
        let mut kind = std::mem::replace(&mut self.kind, ObjectKind::Bitmap(BitmapObject::default()));
        let result = match &mut kind {
            ObjectKind::Sprite(obj) => obj.parse(self, stream),
            ObjectKind::Bitmap(obj) => obj.parse(self, stream),
            ObjectKind::Link(obj) => obj.parse(self, stream),
            ObjectKind::Text(obj) => obj.parse(self, stream),
            ObjectKind::Sound(obj) => obj.parse(self, stream),
            ObjectKind::Movie(obj) => obj.parse(self, stream),
            ObjectKind::Command(obj) => obj.parse(self, stream, ctx),
            ObjectKind::VariableDecl(obj) => obj.parse(self, stream, ctx),
            ObjectKind::Expression(obj) => obj.parse(self, stream, ctx),
            ObjectKind::ResiduePrint(obj) => obj.parse(self, stream),
            ObjectKind::Dossier(obj) => obj.parse(self, stream),
            ObjectKind::Button(obj) => obj.parse(self, stream),
            ObjectKind::Character(obj) => obj.parse(self, stream),
            ObjectKind::Thing(obj) => obj.parse(self, stream),
            ObjectKind::Area(obj) => obj.parse(self, stream),
            ObjectKind::Custom(obj) => obj.parse(self, stream),
        };
        self.kind = kind;
        stream.eat_terminator();
        result
    }

    /// The scripted action. Reads the store (a residue print checks its
    /// touched-variable) but all writes travel back as effects.
    pub fn run(&mut self, device: &str, vars: &VariableStore) -> Vec<Effect> {
        let name = self.name.clone();
        let file = self.file_name.clone();
        let mut kind = std::mem::replace(&mut self.kind, ObjectKind::Bitmap(BitmapObject::default()));
        let effects = match &mut kind {
            ObjectKind::Link(obj) => obj.run(),
            ObjectKind::Sound(obj) => obj.run(&name, &file),
            ObjectKind::Movie(obj) => obj.run(self, &name, &file),
            ObjectKind::Command(obj) => obj.run(device),
            ObjectKind::VariableDecl(obj) => obj.run(self),
            ObjectKind::Expression(obj) => obj.run(device),
            ObjectKind::ResiduePrint(obj) => obj.run(self, device, vars),
            ObjectKind::Dossier(obj) => obj.run(self),
            ObjectKind::Button(obj) => obj.run(self),
            _ => Vec::new(),
        };
        self.kind = kind;
        effects
    }

    /// Renderer collaborator call for one attached, visible object.
    pub fn update(&self, renderer: &dyn Renderer) {
        let rect = self.rect();
        renderer.update(
            self.kind.tag(),
            &self.name,
            self.position.unwrap_or_default(),
            Rect::new(0, 0, rect.width, rect.height),
        );
    }
}

/// Read the common statement header: `[name] = payload`. The name is
/// optional (anonymous text and command objects are common in scripts);
/// the payload is the resource file, text literal or opcode.
pub fn read_header(stream: &mut ScriptStream<'_>) -> (String, String) {
    let mut name = String::new();
    stream.eat_white();
    if stream.peek() != Some('=') {
        name = stream.read_token();
    }
    stream.eat_white();
    let mut payload = String::new();
    if stream.peek() == Some('=') {
        stream.get();
        payload = stream.read_quoted_or_word();
    }
    (name, payload)
}

/// Fields shared by the visual kinds. Returns true when the token was
/// consumed here.
pub fn parse_common_field(
    object: &mut BagObject,
    token: &str,
    stream: &mut ScriptStream<'_>,
) -> Result<bool, ScriptError> {
    match token {
        "POS" => {
            object.set_position(stream.read_point()?);
            Ok(true)
        }
        "SIZE" => {
            let pair = stream.read_point()?;
            object.set_size(Size::new(pair.x, pair.y));
            Ok(true)
        }
        "HIDDEN" => {
            object.set_visible(false);
            Ok(true)
        }
        "MODAL" => {
            object.set_modal(true);
            Ok(true)
        }
        _ => Ok(false),
    }
}
