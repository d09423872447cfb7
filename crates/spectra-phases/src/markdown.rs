//! Markdown section splitting.

use serde::{Deserialize, Serialize};

/// A `#` or `##` heading and the number of lines under it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
  pub name: String,
  pub line_count: usize,
}

/// Split lines into sections at `# ` and `## ` headings.
///
/// Lines before the first heading belong to no section. Deeper headings count
/// as body lines. Headings with an empty name are dropped.
pub fn extract_sections<'a, I>(lines: I) -> Vec<Section>
where
  I: IntoIterator<Item = &'a str>,
{
  let mut sections = Vec::new();
  let mut current: Option<Section> = None;

  for line in lines {
    let heading = line
      .strip_prefix("# ")
      .or_else(|| line.strip_prefix("## "));

    match heading {
      Some(name) => {
        sections.extend(current.take().filter(|s| !s.name.is_empty()));
        current = Some(Section {
          name: name.trim().to_string(),
          line_count: 0,
        });
      }
      None => {
        if let Some(section) = current.as_mut() {
          section.line_count += 1;
        }
      }
    }
  }

  sections.extend(current.filter(|s| !s.name.is_empty()));
  sections
}
