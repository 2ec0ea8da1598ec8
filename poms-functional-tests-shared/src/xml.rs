//! Small queries over XML responses.
//!
//! POMS documents are namespaced (`urn:vpro:media:update:2009`,
//! `urn:vpro:media:search:2012`, ...) and the prefixes differ per endpoint,
//! so everything here matches on local names only.
//!
//! The edit functions rewrite a document event by event, so whatever they
//! don't touch survives byte for byte. Inserted fragments are written
//! verbatim and pick up the namespace in scope.

use quick_xml::events::{BytesStart, Event};
use quick_xml::{Reader, Writer};

/// Errors while reading an XML document.
pub type XmlError = quick_xml::Error;

/// Value of an attribute on the document element, like `/s:list/@totalCount`.
pub fn root_attribute(doc: &str, name: &str) -> Result<Option<String>, XmlError> {
    let mut reader = Reader::from_str(doc);
    loop {
        match reader.read_event()? {
            Event::Start(e) | Event::Empty(e) => return attribute(&e, name),
            Event::Eof => return Ok(None),
            _ => {}
        }
    }
}

/// Texts of the elements at `path`, a list of local names starting with the
/// document element. `["program", "images", "image", "title"]` is
/// `/program/images/image/title`.
pub fn texts_at(doc: &str, path: &[&str]) -> Result<Vec<String>, XmlError> {
    select(doc, path, None)
}

/// Like [`texts_at`], keeping only elements whose attribute `attr` equals
/// `value`: `/program/title[@type='MAIN']`.
pub fn texts_with_attribute(
    doc: &str,
    path: &[&str],
    attr: &str,
    value: &str,
) -> Result<Vec<String>, XmlError> {
    select(doc, path, Some((attr, value)))
}

/// Replaces the children of the document element for which `matches` holds
/// by `replacement`.
///
/// The replacement takes the place of the first matching child. Without a
/// match it goes before the first child named in `before`, or last.
pub fn replace_children(
    doc: &str,
    matches: impl Fn(&BytesStart<'_>) -> bool,
    replacement: &str,
    before: &[&str],
) -> Result<String, XmlError> {
    let has_match = has_child(doc, &matches)?;
    let mut reader = Reader::from_str(doc);
    let mut writer = Writer::new(Vec::new());
    let mut depth = 0usize;
    // depth inside a dropped child
    let mut skipping = 0usize;
    let mut inserted = false;

    loop {
        let event = reader.read_event()?;
        if skipping > 0 {
            match event {
                Event::Start(_) => skipping += 1,
                Event::End(_) => skipping -= 1,
                Event::Eof => break,
                _ => {}
            }
            continue;
        }
        match &event {
            Event::Empty(e) if depth == 0 => {
                writer.write_event(Event::Start(e.clone()))?;
                writer.get_mut().extend_from_slice(replacement.as_bytes());
                writer.write_event(Event::End(e.to_end()))?;
                inserted = true;
                continue;
            }
            Event::Start(e) | Event::Empty(e) if depth == 1 => {
                if matches(e) {
                    if !inserted {
                        writer.get_mut().extend_from_slice(replacement.as_bytes());
                        inserted = true;
                    }
                    if matches!(event, Event::Start(_)) {
                        skipping = 1;
                    }
                    continue;
                }
                if !inserted && !has_match && before.contains(&local_name(e).as_str()) {
                    writer.get_mut().extend_from_slice(replacement.as_bytes());
                    inserted = true;
                }
            }
            Event::End(_) if depth == 1 && !inserted => {
                writer.get_mut().extend_from_slice(replacement.as_bytes());
                inserted = true;
            }
            Event::Eof => break,
            _ => {}
        }
        match event {
            Event::Start(_) => depth += 1,
            Event::End(_) => depth = depth.saturating_sub(1),
            _ => {}
        }
        writer.write_event(event)?;
    }
    Ok(String::from_utf8_lossy(&writer.into_inner()).into_owned())
}

fn has_child(doc: &str, matches: &impl Fn(&BytesStart<'_>) -> bool) -> Result<bool, XmlError> {
    let mut reader = Reader::from_str(doc);
    let mut depth = 0usize;
    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                if depth == 1 && matches(&e) {
                    return Ok(true);
                }
                depth += 1;
            }
            Event::Empty(e) if depth == 1 && matches(&e) => return Ok(true),
            Event::End(_) => depth = depth.saturating_sub(1),
            Event::Eof => return Ok(false),
            _ => {}
        }
    }
}

/// Appends `child` to the child `parent` of the document element, like a new
/// image to `/program/images`. A missing `parent` is created before the
/// first child named in `before`, or last.
pub fn append_child(
    doc: &str,
    parent: &str,
    child: &str,
    before: &[&str],
) -> Result<String, XmlError> {
    let mut reader = Reader::from_str(doc);
    let mut writer = Writer::new(Vec::new());
    let mut depth = 0usize;
    let mut inside = false;
    let mut done = false;
    let created = format!("<{parent}>{child}</{parent}>");

    loop {
        let event = reader.read_event()?;
        match &event {
            Event::Start(e) if depth == 1 && !done && local_name(e) == parent => {
                inside = true;
            }
            Event::Empty(e) if depth == 1 && !done && local_name(e) == parent => {
                writer.write_event(Event::Start(e.clone()))?;
                writer.get_mut().extend_from_slice(child.as_bytes());
                writer.write_event(Event::End(e.to_end()))?;
                done = true;
                continue;
            }
            Event::Start(e) | Event::Empty(e)
                if depth == 1 && !done && before.contains(&local_name(e).as_str()) =>
            {
                writer.get_mut().extend_from_slice(created.as_bytes());
                done = true;
            }
            Event::End(_) if depth == 2 && inside => {
                writer.get_mut().extend_from_slice(child.as_bytes());
                inside = false;
                done = true;
            }
            Event::End(_) if depth == 1 && !done => {
                writer.get_mut().extend_from_slice(created.as_bytes());
                done = true;
            }
            Event::Eof => break,
            _ => {}
        }
        match event {
            Event::Start(_) => depth += 1,
            Event::End(_) => depth = depth.saturating_sub(1),
            _ => {}
        }
        writer.write_event(event)?;
    }
    Ok(String::from_utf8_lossy(&writer.into_inner()).into_owned())
}

/// Whether `e` is named `name`, ignoring its prefix.
pub fn is_element(e: &BytesStart<'_>, name: &str) -> bool {
    e.local_name().as_ref() == name.as_bytes()
}

/// Whether `e` has attribute `name` with `value`.
pub fn has_attribute(e: &BytesStart<'_>, name: &str, value: &str) -> bool {
    matches!(attribute(e, name), Ok(Some(actual)) if actual == value)
}

fn select(doc: &str, path: &[&str], filter: Option<(&str, &str)>) -> Result<Vec<String>, XmlError> {
    let mut reader = Reader::from_str(doc);
    let mut stack: Vec<String> = Vec::new();
    let mut found = Vec::new();
    // text collected for the currently matched element
    let mut current: Option<String> = None;

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                stack.push(local_name(&e));
                if current.is_none() && stack_matches(&stack, path) && passes(&e, filter)? {
                    current = Some(String::new());
                }
            }
            Event::Empty(e) => {
                stack.push(local_name(&e));
                if current.is_none() && stack_matches(&stack, path) && passes(&e, filter)? {
                    found.push(String::new());
                }
                stack.pop();
            }
            Event::Text(t) => {
                if let Some(text) = current.as_mut() {
                    text.push_str(&t.unescape()?);
                }
            }
            Event::CData(t) => {
                if let Some(text) = current.as_mut() {
                    text.push_str(&String::from_utf8_lossy(&t));
                }
            }
            Event::End(_) => {
                if stack_matches(&stack, path) {
                    if let Some(text) = current.take() {
                        found.push(text);
                    }
                }
                stack.pop();
            }
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(found)
}

fn stack_matches(stack: &[String], path: &[&str]) -> bool {
    stack.len() == path.len() && stack.iter().zip(path).all(|(a, b)| a == b)
}

fn passes(e: &BytesStart<'_>, filter: Option<(&str, &str)>) -> Result<bool, XmlError> {
    match filter {
        None => Ok(true),
        Some((name, value)) => Ok(attribute(e, name)?.as_deref() == Some(value)),
    }
}

fn local_name(e: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(e.local_name().as_ref()).into_owned()
}

fn attribute(e: &BytesStart<'_>, name: &str) -> Result<Option<String>, XmlError> {
    for attr in e.attributes() {
        let attr = attr.map_err(XmlError::from)?;
        if attr.key.local_name().as_ref() == name.as_bytes() {
            return Ok(Some(attr.unescape_value()?.into_owned()));
        }
    }
    Ok(None)
}
