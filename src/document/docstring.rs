//! `parse_docstring(text) -> Parsed`, the external interface spec.md treats
//! as a collaborator micro-library (see spec.md §1, §6). Implements the
//! Google-style docstring convention used throughout the Starlark/Python
//! ecosystem: a leading description, then zero or more `Name:`-headed
//! sections, each either a `Fields` block (`Args:`/`Arguments:`/
//! `Parameters:`, one `name: text` entry per parameter) or a free-form
//! `Remarks` block (`Returns:`, `Note:`, ...).

const FIELD_SECTION_TITLES: &[&str] = &["Args", "Arguments", "Parameters"];

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Field {
    pub name: String,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FieldsBlock {
    pub title: String,
    pub fields: Vec<Field>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RemarkBlock {
    pub title: String,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Parsed {
    pub description: String,
    pub fields: Vec<FieldsBlock>,
    pub remarks: Vec<RemarkBlock>,
}

impl Parsed {
    pub fn field_doc(&self, param_name: &str) -> Option<&str> {
        self.fields
            .iter()
            .flat_map(|block| block.fields.iter())
            .find(|f| f.name == param_name)
            .map(|f| f.text.as_str())
    }

    pub fn remark(&self, title: &str) -> Option<&str> {
        self.remarks
            .iter()
            .find(|r| r.title.eq_ignore_ascii_case(title))
            .map(|r| r.text.as_str())
    }
}

/// Splits on blank lines, trims trailing whitespace from every line, and
/// drops leading/trailing blank lines.
fn normalized_lines(text: &str) -> Vec<String> {
    let lines: Vec<&str> = text.split('\n').collect();
    let trimmed: Vec<String> = lines.iter().map(|l| l.trim_end().to_string()).collect();
    let start = trimmed.iter().position(|l| !l.trim().is_empty());
    let end = trimmed.iter().rposition(|l| !l.trim().is_empty());
    match (start, end) {
        (Some(s), Some(e)) => trimmed[s..=e].to_vec(),
        _ => Vec::new(),
    }
}

/// Removes the minimal common leading whitespace across all non-blank
/// lines, leaving relative indentation intact.
fn deindent(lines: &[String]) -> Vec<String> {
    let min_indent = lines
        .iter()
        .filter(|l| !l.trim().is_empty())
        .map(|l| l.len() - l.trim_start().len())
        .min()
        .unwrap_or(0);
    lines
        .iter()
        .map(|l| {
            if l.trim().is_empty() {
                String::new()
            } else {
                l.chars().skip(min_indent).collect()
            }
        })
        .collect()
}

fn indent_of(line: &str) -> usize {
    line.len() - line.trim_start().len()
}

/// A line is a top-level section header if, once deindented to the
/// document's base, it has zero leading whitespace and looks like
/// `Title:` with no other content on the line.
fn section_header(line: &str) -> Option<String> {
    if indent_of(line) != 0 {
        return None;
    }
    let trimmed = line.trim_end();
    let title = trimmed.strip_suffix(':')?;
    if title.is_empty() || !title.chars().all(|c| c.is_alphanumeric() || c == ' ') {
        return None;
    }
    if title.chars().next()?.is_alphabetic() {
        Some(title.to_string())
    } else {
        None
    }
}

fn parse_fields_block(body: &[String]) -> Vec<Field> {
    let body = deindent(body);
    let mut fields = Vec::new();
    let mut i = 0;
    while i < body.len() {
        let line = &body[i];
        if line.trim().is_empty() {
            i += 1;
            continue;
        }
        if indent_of(line) == 0 {
            let (name, mut rest) = match line.split_once(':') {
                Some((n, r)) => (n.trim().to_string(), r.trim().to_string()),
                None => (line.trim().to_string(), String::new()),
            };
            i += 1;
            while i < body.len() && (body[i].trim().is_empty() || indent_of(&body[i]) > 0) {
                let cont = body[i].trim();
                if !cont.is_empty() {
                    if !rest.is_empty() {
                        rest.push(' ');
                    }
                    rest.push_str(cont);
                }
                i += 1;
            }
            fields.push(Field { name, text: rest });
        } else {
            i += 1;
        }
    }
    fields
}

fn parse_remark_block(body: &[String]) -> String {
    deindent(body).join("\n").trim().to_string()
}

pub fn parse(text: &str) -> Parsed {
    let lines = normalized_lines(text);

    let mut first_header = lines.len();
    for (i, line) in lines.iter().enumerate() {
        if section_header(line).is_some() {
            first_header = i;
            break;
        }
    }

    let description = deindent(&lines[..first_header]).join("\n").trim().to_string();

    let mut fields = Vec::new();
    let mut remarks = Vec::new();

    let mut i = first_header;
    while i < lines.len() {
        let Some(title) = section_header(&lines[i]) else {
            i += 1;
            continue;
        };
        let body_start = i + 1;
        let mut body_end = lines.len();
        for (j, line) in lines.iter().enumerate().skip(body_start) {
            if section_header(line).is_some() {
                body_end = j;
                break;
            }
        }
        let body = &lines[body_start..body_end];

        if FIELD_SECTION_TITLES.contains(&title.as_str()) {
            fields.push(FieldsBlock {
                title,
                fields: parse_fields_block(body),
            });
        } else {
            remarks.push(RemarkBlock {
                title,
                text: parse_remark_block(body),
            });
        }

        i = body_end;
    }

    Parsed {
        description,
        fields,
        remarks,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_description_args_and_remarks() {
        let doc = parse(
            "An ACL entry for a role.\n\n  Extra paragraph.\n\n  Args:\n    roles: a role \
             or list of roles,\n        spanning two lines.\n    groups: a group name.\n\n  \
             Returns:\n    acl.entry struct.\n    Multiline.\n\n  Note:\n    blah-blah.\n",
        );

        assert_eq!(doc.description, "An ACL entry for a role.\n\nExtra paragraph.");
        assert_eq!(doc.fields.len(), 1);
        assert_eq!(doc.fields[0].title, "Args");
        assert_eq!(
            doc.fields[0].fields,
            vec![
                Field {
                    name: "roles".into(),
                    text: "a role or list of roles, spanning two lines.".into()
                },
                Field {
                    name: "groups".into(),
                    text: "a group name.".into()
                },
            ]
        );
        assert_eq!(doc.field_doc("groups"), Some("a group name."));
        assert_eq!(
            doc.remark("Returns"),
            Some("acl.entry struct.\nMultiline.")
        );
        assert_eq!(doc.remark("Note"), Some("blah-blah."));
    }

    #[test]
    fn empty_docstring_has_empty_description() {
        let doc = parse("");
        assert_eq!(doc.description, "");
        assert!(doc.fields.is_empty());
        assert!(doc.remarks.is_empty());
    }

    #[test]
    fn description_only_docstring_has_no_sections() {
        let doc = parse("Just a one-liner.");
        assert_eq!(doc.description, "Just a one-liner.");
        assert!(doc.fields.is_empty());
    }

    #[test]
    fn deindent_keeps_relative_indentation() {
        let lines = vec![
            "   ".to_string(),
            "  a".to_string(),
            "  b".to_string(),
            "    c".to_string(),
        ];
        assert_eq!(deindent(&lines), vec!["", "a", "b", "  c"]);
    }
}
