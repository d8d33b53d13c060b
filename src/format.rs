//! Generic payload formatter
//!
//! Turns any [`Inspect`] value into a line-oriented report:
//!
//! ```text
//! [Verified]
//! Nickname : Door1
//! IsOpen : True
//! Tags : Vec<String>
//!     Length : 2
//!     [0] : red
//!     [1] : blue
//! ```
//!
//! Nested expansion goes exactly one level deep. Top-level read failures render
//! as `Error[<message>]`, nested ones as the literal `null`.

use std::collections::HashSet;
use std::fmt::Write;
use std::panic::{self, AssertUnwindSafe};

use crate::inspect::{Attribute, Inspect, Layout, Shape, Value, panic_message};

/// Suffix stripped from payload type names in report headers
pub const PAYLOAD_SUFFIX: &str = "EventArgs";

const INDENT: &str = "    ";

/// Stateless renderer configured with the nested-type exclusion set
#[derive(Debug, Clone, Default)]
pub struct Formatter {
    nest_exclusions: HashSet<String>,
}

impl Formatter {
    pub fn new(nest_exclusions: HashSet<String>) -> Self {
        Self { nest_exclusions }
    }

    /// Whether attributes of this type name are never expanded
    pub fn is_excluded(&self, type_name: &str) -> bool {
        self.nest_exclusions.contains(type_name)
    }

    /// Report for an event carrying a payload
    pub fn render(&self, name: &str, payload: &dyn Inspect) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "{}", header(name));

        for attribute in payload.attributes() {
            self.render_attribute(&mut out, attribute);
        }

        trim_trailing_newlines(out)
    }

    /// Report for a payload-less event: the header line only
    pub fn render_signal(&self, name: &str) -> String {
        header(name)
    }

    fn render_attribute(&self, out: &mut String, attribute: Attribute<'_>) {
        let Attribute { name, layout, value } = attribute;

        match &value {
            Ok(v) => match guarded(|| v.display()) {
                Ok(text) => {
                    let _ = writeln!(out, "{} : {}", name, text);
                }
                Err(message) => {
                    let _ = writeln!(out, "{} : Error[{}]", name, message);
                }
            },
            Err(e) => {
                let _ = writeln!(out, "{} : Error[{}]", name, e);
            }
        }

        if self.is_excluded(layout.type_name) || !layout.shape.is_expandable() {
            return;
        }

        let value = value.ok();
        match layout.shape {
            Shape::Text => {}
            Shape::Sequence { counted } => render_sequence(out, value.as_ref().and_then(Value::get), counted),
            Shape::Object => render_object(out, &layout, value.as_ref().and_then(Value::get)),
            Shape::Primitive | Shape::Enum => {}
        }
    }
}

/// `[Name]`, with the payload suffix removed from the end of the name
pub fn header(name: &str) -> String {
    format!("[{}]", name.strip_suffix(PAYLOAD_SUFFIX).unwrap_or(name))
}

/// Run a read that may panic, turning the panic into its message
fn guarded<T>(read: impl FnOnce() -> T) -> Result<T, String> {
    panic::catch_unwind(AssertUnwindSafe(read)).map_err(|payload| panic_message(payload.as_ref()))
}

/// Nested-level text of an element or member: failures become `null`
fn nested_text(element: eyre::Result<Value<'_>>) -> String {
    element
        .ok()
        .and_then(|v| guarded(|| v.display()).ok())
        .unwrap_or_else(|| "null".to_string())
}

fn render_sequence(out: &mut String, value: Option<&dyn Inspect>, counted: bool) {
    let Some(elements) = value.and_then(|v| guarded(|| v.elements()).ok().flatten()) else {
        return;
    };

    if counted {
        let _ = writeln!(out, "{}Length : {}", INDENT, elements.len());
    }

    for (index, element) in elements.into_iter().enumerate() {
        let _ = writeln!(out, "{}[{}] : {}", INDENT, index, nested_text(element));
    }
}

fn render_object(out: &mut String, layout: &Layout, value: Option<&dyn Inspect>) {
    let Some(members) = value.and_then(|v| guarded(|| v.declared()).ok()) else {
        // Nothing to read from: every declared member fails
        for member in layout.declared {
            let _ = writeln!(out, "{}{} : null", INDENT, member);
        }
        return;
    };

    for member in members {
        let _ = writeln!(out, "{}{} : {}", INDENT, member.name, nested_text(member.value));
    }
}

fn trim_trailing_newlines(mut out: String) -> String {
    let len = out.trim_end_matches(['\n', '\r']).len();
    out.truncate(len);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use eyre::eyre;

    struct Position {
        x: f32,
        y: f32,
    }

    impl Inspect for Position {
        fn layout() -> Layout {
            Layout::object("game::Position", &["X", "Y"])
        }

        fn describe(&self) -> Layout {
            Self::layout()
        }

        fn display(&self) -> String {
            format!("({}, {})", self.x, self.y)
        }

        fn attributes(&self) -> Vec<Attribute<'_>> {
            vec![Attribute::field("X", &self.x), Attribute::field("Y", &self.y)]
        }
    }

    struct DoorEventArgs {
        name: String,
        is_open: bool,
        tags: Vec<String>,
    }

    impl Inspect for DoorEventArgs {
        fn layout() -> Layout {
            Layout::object("game::DoorEventArgs", &["Name", "IsOpen", "Tags"])
        }

        fn describe(&self) -> Layout {
            Self::layout()
        }

        fn display(&self) -> String {
            "DoorEventArgs".to_string()
        }

        fn attributes(&self) -> Vec<Attribute<'_>> {
            vec![
                Attribute::field("Name", &self.name),
                Attribute::field("IsOpen", &self.is_open),
                Attribute::field("Tags", &self.tags),
            ]
        }
    }

    struct Flaky {
        position: Position,
    }

    impl Inspect for Flaky {
        fn layout() -> Layout {
            Layout::object("game::Flaky", &["Health", "Position", "Lost"])
        }

        fn describe(&self) -> Layout {
            Self::layout()
        }

        fn display(&self) -> String {
            "Flaky".to_string()
        }

        fn attributes(&self) -> Vec<Attribute<'_>> {
            vec![
                Attribute::computed::<f32>("Health", Err(eyre!("player disconnected"))),
                Attribute::field("Position", &self.position),
                Attribute::computed::<Position>("Lost", Err(eyre!("gone"))),
            ]
        }
    }

    /// Readable members, but its own text cannot be produced
    struct Poisoned;

    impl Inspect for Poisoned {
        fn layout() -> Layout {
            Layout::object("game::Poisoned", &["Inner"])
        }

        fn describe(&self) -> Layout {
            Self::layout()
        }

        fn display(&self) -> String {
            panic!("poisoned display")
        }

        fn attributes(&self) -> Vec<Attribute<'_>> {
            vec![Attribute::field("Inner", &1u8)]
        }
    }

    struct Holder {
        poisoned: Poisoned,
    }

    impl Inspect for Holder {
        fn layout() -> Layout {
            Layout::object("game::Holder", &["Poisoned", "Count"])
        }

        fn describe(&self) -> Layout {
            Self::layout()
        }

        fn display(&self) -> String {
            "Holder".to_string()
        }

        fn attributes(&self) -> Vec<Attribute<'_>> {
            vec![Attribute::field("Poisoned", &self.poisoned), Attribute::field("Count", &3u8)]
        }
    }

    struct PoisonedArgs {
        poisoned: Poisoned,
        holder: Holder,
        list: Vec<Poisoned>,
        empty: Vec<String>,
    }

    impl Inspect for PoisonedArgs {
        fn layout() -> Layout {
            Layout::object("game::PoisonedArgs", &["P", "Holder", "List", "Empty", "Tail"])
        }

        fn describe(&self) -> Layout {
            Self::layout()
        }

        fn display(&self) -> String {
            "PoisonedArgs".to_string()
        }

        fn attributes(&self) -> Vec<Attribute<'_>> {
            vec![
                Attribute::field("P", &self.poisoned),
                Attribute::field("Holder", &self.holder),
                Attribute::field("List", &self.list),
                Attribute::field("Empty", &self.empty),
                Attribute::field("Tail", &1u8),
            ]
        }
    }

    fn door() -> DoorEventArgs {
        DoorEventArgs {
            name: "Door1".to_string(),
            is_open: true,
            tags: vec!["red".to_string(), "blue".to_string()],
        }
    }

    #[test]
    fn test_header_strips_suffix() {
        assert_eq!(header("InteractingDoorEventArgs"), "[InteractingDoor]");
        assert_eq!(header("RoundStarted"), "[RoundStarted]");
        assert_eq!(header("EventArgsHolder"), "[EventArgsHolder]");
    }

    #[test]
    fn test_render_example_payload() {
        let report = Formatter::default().render("MyEventArgs", &door());
        let expected = "[MyEvent]\n\
                        Name : Door1\n\
                        IsOpen : True\n\
                        Tags : Vec<String>\n    \
                        Length : 2\n    \
                        [0] : red\n    \
                        [1] : blue";
        assert_eq!(report, expected);
    }

    #[test]
    fn test_render_no_trailing_newline() {
        let report = Formatter::default().render("Door", &door());
        assert!(!report.ends_with('\n'));
    }

    #[test]
    fn test_render_signal() {
        assert_eq!(Formatter::default().render_signal("RoundStarted"), "[RoundStarted]");
    }

    #[test]
    fn test_excluded_type_not_expanded() {
        let formatter = Formatter::new(HashSet::from([std::any::type_name::<Vec<String>>().to_string()]));
        let report = formatter.render("Door", &door());
        assert!(report.contains("Tags : Vec<String>"));
        assert!(!report.contains("Length"));
        assert!(!report.contains("[0]"));
        assert_eq!(report.lines().count(), 4);
    }

    #[test]
    fn test_failing_getter_renders_error() {
        let flaky = Flaky {
            position: Position { x: 1.5, y: -2.0 },
        };
        let report = Formatter::default().render("Flaky", &flaky);
        let lines: Vec<&str> = report.lines().collect();
        assert_eq!(
            lines,
            vec![
                "[Flaky]",
                "Health : Error[player disconnected]",
                "Position : (1.5, -2)",
                "    X : 1.5",
                "    Y : -2",
                "Lost : Error[gone]",
                "    X : null",
                "    Y : null",
            ]
        );
    }

    #[test]
    fn test_top_level_lines_match_attribute_count() {
        let report = Formatter::default().render("Door", &door());
        let top_level = report.lines().skip(1).filter(|l| !l.starts_with(INDENT)).count();
        assert_eq!(top_level, door().attributes().len());
    }

    #[test]
    fn test_panicking_display_is_contained() {
        let args = PoisonedArgs {
            poisoned: Poisoned,
            holder: Holder { poisoned: Poisoned },
            list: vec![Poisoned, Poisoned],
            empty: Vec::new(),
        };
        let list_text = format!("List : {}", args.list.display());
        let empty_text = format!("Empty : {}", args.empty.display());

        let report = Formatter::default().render("PoisonedArgs", &args);
        let lines: Vec<&str> = report.lines().collect();
        assert_eq!(
            lines,
            vec![
                "[PoisonedArgs]",
                "P : Error[poisoned display]",
                "    Inner : 1",
                "Holder : Holder",
                "    Poisoned : null",
                "    Count : 3",
                list_text.as_str(),
                "    Length : 2",
                "    [0] : null",
                "    [1] : null",
                empty_text.as_str(),
                "    Length : 0",
                "Tail : 1",
            ]
        );
    }

    #[test]
    fn test_empty_sequence_has_zero_length_and_no_elements() {
        let empty = DoorEventArgs {
            tags: Vec::new(),
            ..door()
        };
        let report = Formatter::default().render("DoorEventArgs", &empty);
        assert!(report.ends_with("Tags : Vec<String>\n    Length : 0"));
        assert!(!report.contains("[0]"));
        assert_eq!(report.lines().count(), 5);
    }
}
