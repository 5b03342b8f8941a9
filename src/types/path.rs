//! Defines an [`ObjectPath`], the dotted property path an argument token
//! refers to.

/// A parsed property path, e.g. `user.address.city` or `items.$(#index)`.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectPath {
    pub segments: Vec<Segment>,
    pub mode: PathMode,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Segment {
    Name(String),
    /// A `$name` or `$(path)` segment whose property name is the string value
    /// of another path.
    Computed(ObjectPath),
}

/// Where the lookup of the first segment starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathMode {
    /// Search every frame from the innermost outwards and then the globals.
    Default,
    /// `.`, `@0`, `@1`: the value of the frame this many levels out.
    Frame(usize),
    /// `_` or `@root`: the outermost frame.
    Root,
    /// `@global`: the global variables.
    Global,
    /// `#` or `#key`: the key of the current enumeration.
    Key,
    /// `##` or `#index`: the position of the current enumeration.
    Index,
    /// `#count`: the number of entries being enumerated.
    Count,
}

impl ObjectPath {
    pub fn parse(text: &str) -> Self {
        let mut segments = Vec::new();
        let mut pos = 0;
        while pos < text.len() {
            match match_segment(text, pos) {
                Some((segment, end)) => {
                    segments.push(segment);
                    pos = end;
                }
                None => pos += next_char_len(text, pos),
            }
        }
        if segments.is_empty() {
            segments.push(Segment::Name(text.to_owned()));
        }
        let mode = match &segments[0] {
            Segment::Name(name) => PathMode::from_name(name),
            Segment::Computed(_) => PathMode::Default,
        };
        Self { segments, mode }
    }

    /// Returns `true` if the path has more than one segment.
    pub fn is_compound(&self) -> bool {
        self.segments.len() > 1
    }

    /// The text of the first segment, empty for a computed segment.
    pub fn head(&self) -> &str {
        match &self.segments[0] {
            Segment::Name(name) => name,
            Segment::Computed(_) => "",
        }
    }
}

impl PathMode {
    fn from_name(name: &str) -> Self {
        match name {
            "." => Self::Frame(0),
            "_" | "@root" => Self::Root,
            "@global" => Self::Global,
            "#" | "#key" => Self::Key,
            "##" | "#index" => Self::Index,
            "#count" => Self::Count,
            _ => match name.strip_prefix('@').map(str::parse) {
                Some(Ok(n)) => Self::Frame(n),
                _ => Self::Default,
            },
        }
    }
}

fn is_name_start(c: char) -> bool {
    !matches!(c, '$' | '.' | '(' | ')')
}

fn next_char_len(text: &str, pos: usize) -> usize {
    text[pos..].chars().next().map_or(1, char::len_utf8)
}

/// Matches a single segment starting exactly at `pos`.
///
/// A segment is either a run of characters up to the next `.` not starting
/// with any of `$.()`, a `$` followed by such a run anywhere but at the start
/// of the path, or `$(...)`.
fn match_segment(text: &str, pos: usize) -> Option<(Segment, usize)> {
    let rest = &text[pos..];

    if let Some(after) = rest.strip_prefix('$') {
        if pos > 0 && after.starts_with(is_name_start) {
            let len = after.find('.').unwrap_or(after.len());
            let nested = ObjectPath::parse(&after[..len]);
            return Some((Segment::Computed(nested), pos + 1 + len));
        }
        if let Some(inner) = after.strip_prefix('(') {
            let len = inner.find(')')?;
            if len == 0 {
                return None;
            }
            let nested = ObjectPath::parse(&inner[..len]);
            return Some((Segment::Computed(nested), pos + 2 + len + 1));
        }
        return None;
    }

    if rest.starts_with(is_name_start) {
        let len = rest.find('.').unwrap_or(rest.len());
        return Some((Segment::Name(rest[..len].to_owned()), pos + len));
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(path: &ObjectPath) -> Vec<String> {
        path.segments
            .iter()
            .map(|s| match s {
                Segment::Name(n) => n.clone(),
                Segment::Computed(p) => format!("${}", names(p).join(".")),
            })
            .collect()
    }

    #[test]
    fn parse_dotted() {
        let path = ObjectPath::parse("user.address.city");
        assert_eq!(names(&path), ["user", "address", "city"]);
        assert_eq!(path.mode, PathMode::Default);
        assert!(path.is_compound());
    }

    #[test]
    fn parse_computed() {
        let path = ObjectPath::parse("items.$key.$(a.b)");
        assert_eq!(names(&path), ["items", "$key", "$a.b"]);
    }

    #[test]
    fn parse_leading_computed() {
        let path = ObjectPath::parse("$(a).b");
        assert_eq!(names(&path), ["$a", "b"]);
        assert_eq!(path.mode, PathMode::Default);
    }

    #[test]
    fn parse_leading_dollar_name() {
        let path = ObjectPath::parse("$user.name");
        assert_eq!(names(&path), ["user", "name"]);
        assert_eq!(path.mode, PathMode::Default);
        assert_eq!(ObjectPath::parse("$#count").mode, PathMode::Count);
    }

    #[test]
    fn parse_modes() {
        assert_eq!(ObjectPath::parse(".").mode, PathMode::Frame(0));
        assert_eq!(ObjectPath::parse("@0").mode, PathMode::Frame(0));
        assert_eq!(ObjectPath::parse("@2.name").mode, PathMode::Frame(2));
        assert_eq!(ObjectPath::parse("_").mode, PathMode::Root);
        assert_eq!(ObjectPath::parse("@root.x").mode, PathMode::Root);
        assert_eq!(ObjectPath::parse("@global.site").mode, PathMode::Global);
        assert_eq!(ObjectPath::parse("#").mode, PathMode::Key);
        assert_eq!(ObjectPath::parse("#key").mode, PathMode::Key);
        assert_eq!(ObjectPath::parse("##").mode, PathMode::Index);
        assert_eq!(ObjectPath::parse("#index").mode, PathMode::Index);
        assert_eq!(ObjectPath::parse("#count").mode, PathMode::Count);
        assert_eq!(ObjectPath::parse("@foo").mode, PathMode::Default);
    }

    #[test]
    fn parse_only_dots() {
        let path = ObjectPath::parse("..");
        assert_eq!(names(&path), [".."]);
        assert!(!path.is_compound());
    }
}
