use crate::ScriptError;

/// Screen-space point. World scripts are authored against a 640x480
/// coordinate space but nothing here depends on that.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Size {
    pub width: i32,
    pub height: i32,
}

impl Size {
    pub fn new(width: i32, height: i32) -> Self {
        Self { width, height }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Rect {
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn from_point_size(origin: Point, size: Size) -> Self {
        Self::new(origin.x, origin.y, size.width, size.height)
    }

    pub fn origin(&self) -> Point {
        Point::new(self.x, self.y)
    }

    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    pub fn right(&self) -> i32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> i32 {
        self.y + self.height
    }

    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.x && point.x < self.right() && point.y >= self.y && point.y < self.bottom()
    }
}

/// Characters that belong to a single alphanumeric token. Resource paths
/// (`$SBARDIR\BAR\CLOSEUP.BMP`), rect literals (`[0,0,52,30]`) and the
/// link anchor fields (`@[x,y]`, `#[x,y]`) must each read as one token.
fn is_word_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric()
        || matches!(
            ch,
            '_' | '.' | '$' | '\\' | '/' | '-' | '#' | '@' | '[' | ']' | ',' | ':'
        )
}

/// Cursor over a fully loaded script buffer. The scene parser only ever
/// needs character-level peeking, whitespace skipping, token reads and a
/// one-token pushback, so that is the whole surface.
pub struct ScriptStream<'a> {
    src: &'a str,
    chars: Vec<char>,
    pos: usize,
    line: usize,
    pushed: Vec<String>,
}

impl<'a> ScriptStream<'a> {
    pub fn new(src: &'a str) -> Self {
        Self {
            src,
            chars: src.chars().collect(),
            pos: 0,
            line: 1,
            pushed: Vec::new(),
        }
    }

    pub fn source(&self) -> &'a str {
        self.src
    }

    /// 1-based line number of the cursor, for parse alerts.
    pub fn line(&self) -> usize {
        self.line
    }

    pub fn eof(&self) -> bool {
        self.pushed.is_empty() && self.pos >= self.chars.len()
    }

    /// Next unconsumed character, without advancing. `None` at end of
    /// stream; callers are expected to check rather than rely on errors.
    pub fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    /// Consume and return one character.
    pub fn get(&mut self) -> Option<char> {
        let ch = self.chars.get(self.pos).copied()?;
        self.pos += 1;
        if ch == '\n' {
            self.line += 1;
        }
        Some(ch)
    }

    pub fn eat_white(&mut self) {
        while matches!(self.peek(), Some(c) if c.is_whitespace()) {
            self.get();
        }
    }

    /// Maximal run of identifier characters. Empty when the cursor sits on
    /// a delimiter or at end of stream.
    pub fn read_alpha_num(&mut self) -> String {
        let mut out = String::new();
        while matches!(self.peek(), Some(c) if is_word_char(c)) {
            out.push(self.get().unwrap_or_default());
        }
        out
    }

    /// Whitespace-skipping token read honoring the pushback queue. The
    /// common read used by the scene parser's keyword dispatch.
    pub fn read_token(&mut self) -> String {
        if let Some(token) = self.pushed.pop() {
            return token;
        }
        self.eat_white();
        self.read_alpha_num()
    }

    /// Re-queue a previously read token. Used for one-token lookahead when
    /// a tag dispatch or a per-kind field parser fails to match.
    pub fn push_back(&mut self, token: impl Into<String>) {
        let token = token.into();
        if !token.is_empty() {
            self.pushed.push(token);
        }
    }

    /// Peek the next token without consuming it.
    pub fn peek_token(&mut self) -> String {
        let token = self.read_token();
        self.push_back(token.clone());
        token
    }

    /// Signed integer literal.
    pub fn read_int(&mut self) -> Result<i32, ScriptError> {
        let token = self.read_token();
        // Line is read after the token so skipped newlines do not blame
        // the line the cursor started on.
        let line = self.line;
        if token.is_empty() {
            return Err(ScriptError::UnexpectedEof { line });
        }
        token
            .parse::<i32>()
            .map_err(|_| ScriptError::MalformedLiteral {
                what: "integer",
                line,
                found: token,
            })
    }

    /// `[x,y,w,h]` literal.
    pub fn read_rect(&mut self) -> Result<Rect, ScriptError> {
        let token = self.read_token();
        let line = self.line;
        parse_rect_token(&token).ok_or(ScriptError::MalformedLiteral {
            what: "rect",
            line,
            found: token,
        })
    }

    /// `[x,y]` literal, also accepting a leading `@` or `#` marker.
    pub fn read_point(&mut self) -> Result<Point, ScriptError> {
        let token = self.read_token();
        let line = self.line;
        parse_point_token(&token).ok_or(ScriptError::MalformedLiteral {
            what: "point",
            line,
            found: token,
        })
    }

    /// A double-quoted string (spaces preserved, no escapes in the source
    /// language) or a bare token.
    pub fn read_quoted_or_word(&mut self) -> String {
        if let Some(token) = self.pushed.pop() {
            return token;
        }
        self.eat_white();
        if self.peek() == Some('"') {
            self.get();
            let mut out = String::new();
            while let Some(ch) = self.get() {
                if ch == '"' {
                    break;
                }
                out.push(ch);
            }
            return out;
        }
        self.read_alpha_num()
    }

    /// Discard the remainder of the current line (comments).
    pub fn skip_line(&mut self) {
        while let Some(ch) = self.get() {
            if ch == '\n' {
                break;
            }
        }
    }

    /// Consume a statement terminator if one is present.
    pub fn eat_terminator(&mut self) {
        self.eat_white();
        if self.peek() == Some(';') {
            self.get();
        }
    }
}

/// `[x,y]` with an optional `@`/`#` anchor marker in front.
pub fn parse_point_token(token: &str) -> Option<Point> {
    let body = token
        .trim_start_matches(['@', '#'])
        .strip_prefix('[')?
        .strip_suffix(']')?;
    let mut parts = body.split(',');
    let x = parts.next()?.trim().parse().ok()?;
    let y = parts.next()?.trim().parse().ok()?;
    if parts.next().is_some() {
        return None;
    }
    Some(Point::new(x, y))
}

pub fn parse_rect_token(token: &str) -> Option<Rect> {
    let body = token.strip_prefix('[')?.strip_suffix(']')?;
    let mut parts = body.split(',');
    let x = parts.next()?.trim().parse().ok()?;
    let y = parts.next()?.trim().parse().ok()?;
    let width = parts.next()?.trim().parse().ok()?;
    let height = parts.next()?.trim().parse().ok()?;
    if parts.next().is_some() {
        return None;
    }
    Some(Rect::new(x, y, width, height))
}
