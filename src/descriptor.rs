//! Animation descriptor (`AnimData.xml`) parsing and serialization
//!
//! The descriptor lists every animation of a sprite:
//!
//! ```xml
//! <AnimData>
//!   <ShadowSize>1</ShadowSize>
//!   <Anims>
//!     <Anim>
//!       <Name>Walk</Name>
//!       <Index>0</Index>
//!       <FrameWidth>32</FrameWidth>
//!       <FrameHeight>40</FrameHeight>
//!       <Durations><Duration>8</Duration><Duration>10</Duration></Durations>
//!     </Anim>
//!     <Anim><Name>EventSleep</Name><CopyOf>Sleep</CopyOf></Anim>
//!   </Anims>
//! </AnimData>
//! ```
//!
//! Parsing is all-or-nothing: any malformed entry fails the whole document.

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;

use crate::registry::AnimRegistry;

/// File name of the descriptor inside a sprite archive.
pub const DESCRIPTOR_FILE: &str = "AnimData.xml";

/// Largest legal `<ShadowSize>`.
pub const MAX_SHADOW_SIZE: u8 = 2;

/// Malformed or semantically invalid descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DescriptorError {
    #[error("descriptor is not valid UTF-8")]
    Encoding,
    #[error("malformed XML: {0}")]
    Xml(String),
    #[error("missing <ShadowSize>")]
    MissingShadowSize,
    #[error("<ShadowSize> must be 0, 1 or 2, found '{0}'")]
    InvalidShadowSize(String),
    #[error("<Anim> entry without a <Name>")]
    MissingName,
    #[error("unknown animation name '{0}'")]
    UnknownAnimation(String),
    #[error("animation '{0}' is listed more than once")]
    DuplicateName(String),
    #[error("index {index} is claimed by both '{first}' and '{second}'")]
    DuplicateIndex { index: i32, first: String, second: String },
    #[error("animation '{0}' has no <Index>")]
    MissingIndex(String),
    #[error("animation '{0}' is missing <FrameWidth>/<FrameHeight>")]
    MissingFrameSize(String),
    #[error("animation '{0}' has no <Durations>")]
    MissingDurations(String),
    #[error("animation '{0}' is a <CopyOf> and cannot declare frame data")]
    AliasWithFrameData(String),
    #[error("index {index} must be '{expected}', found '{found}'")]
    WrongIndexName { index: i32, expected: String, found: String },
    #[error("animation '{anim}': <{field}> is not a valid number: '{value}'")]
    InvalidNumber { anim: String, field: String, value: String },
    #[error("animation '{name}' copies unknown animation '{target}'")]
    DanglingAlias { name: String, target: String },
    #[error("animation '{0}' copies itself through a chain of <CopyOf>")]
    AliasCycle(String),
}

/// Frame event marker that is not set.
pub const NO_FRAME: i32 = -1;

/// One `<Anim>` entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnimationDescriptor {
    pub name: String,
    /// Numeric slot, or [`NO_FRAME`] (-1) for an alias without one
    pub index: i32,
    /// Tile size; `None` only for aliases
    pub frame_size: Option<(u32, u32)>,
    /// Ticks per frame column
    pub durations: Vec<u32>,
    /// Name of the animation whose sheets this one reuses
    pub alias_of: Option<String>,
    pub rush_frame: i32,
    pub hit_frame: i32,
    pub return_frame: i32,
}

impl AnimationDescriptor {
    /// A full entry with frame data and no event markers.
    pub fn new(name: impl Into<String>, index: i32, frame_size: (u32, u32), durations: Vec<u32>) -> Self {
        Self {
            name: name.into(),
            index,
            frame_size: Some(frame_size),
            durations,
            alias_of: None,
            rush_frame: NO_FRAME,
            hit_frame: NO_FRAME,
            return_frame: NO_FRAME,
        }
    }

    /// An entry that copies another animation.
    pub fn alias(name: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            index: NO_FRAME,
            frame_size: None,
            durations: Vec::new(),
            alias_of: Some(target.into()),
            rush_frame: NO_FRAME,
            hit_frame: NO_FRAME,
            return_frame: NO_FRAME,
        }
    }

    pub fn is_alias(&self) -> bool {
        self.alias_of.is_some()
    }

    /// Rush/hit/return markers that are set.
    pub fn frame_events(&self) -> Vec<(&'static str, i32)> {
        [("RushFrame", self.rush_frame), ("HitFrame", self.hit_frame), ("ReturnFrame", self.return_frame)]
            .into_iter()
            .filter(|(_, frame)| *frame != NO_FRAME)
            .collect()
    }
}

/// A parsed descriptor document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnimDescriptor {
    pub shadow_size: u8,
    animations: Vec<AnimationDescriptor>,
    /// lowercase name -> position in `animations`
    by_name: BTreeMap<String, usize>,
    /// index -> position in `animations`
    by_index: BTreeMap<i32, usize>,
}

impl AnimDescriptor {
    /// Parse descriptor bytes against a registry of legal names.
    pub fn parse(bytes: &[u8], registry: &AnimRegistry) -> Result<Self, DescriptorError> {
        let text = std::str::from_utf8(bytes).map_err(|_| DescriptorError::Encoding)?;
        let root = parse_tree(text)?;

        let shadow = root.child("ShadowSize").ok_or(DescriptorError::MissingShadowSize)?;
        let shadow_size = shadow
            .text
            .trim()
            .parse::<u8>()
            .ok()
            .filter(|s| *s <= MAX_SHADOW_SIZE)
            .ok_or_else(|| DescriptorError::InvalidShadowSize(shadow.text.trim().to_string()))?;

        let mut entries = Vec::new();
        root.collect("Anim", &mut entries);
        let animations = entries.into_iter().map(read_anim).collect::<Result<Vec<_>, _>>()?;

        Self::from_entries(shadow_size, animations, registry)
    }

    /// Build a descriptor from entries, applying every document rule.
    pub fn from_entries(
        shadow_size: u8,
        animations: Vec<AnimationDescriptor>,
        registry: &AnimRegistry,
    ) -> Result<Self, DescriptorError> {
        if shadow_size > MAX_SHADOW_SIZE {
            return Err(DescriptorError::InvalidShadowSize(shadow_size.to_string()));
        }

        let mut by_name = BTreeMap::new();
        let mut by_index = BTreeMap::new();

        for (pos, anim) in animations.iter().enumerate() {
            if !registry.is_known(&anim.name) {
                return Err(DescriptorError::UnknownAnimation(anim.name.clone()));
            }
            if by_name.insert(anim.name.to_lowercase(), pos).is_some() {
                return Err(DescriptorError::DuplicateName(anim.name.clone()));
            }

            if anim.is_alias() {
                if anim.frame_size.is_some() || !anim.durations.is_empty() {
                    return Err(DescriptorError::AliasWithFrameData(anim.name.clone()));
                }
            } else {
                if anim.index < 0 {
                    return Err(DescriptorError::MissingIndex(anim.name.clone()));
                }
                let Some((width, height)) = anim.frame_size else {
                    return Err(DescriptorError::MissingFrameSize(anim.name.clone()));
                };
                if anim.durations.is_empty() {
                    return Err(DescriptorError::MissingDurations(anim.name.clone()));
                }
                let zero = [("FrameWidth", width), ("FrameHeight", height)]
                    .into_iter()
                    .chain(anim.durations.iter().map(|d| ("Duration", *d)))
                    .find(|(_, value)| *value == 0);
                if let Some((field, _)) = zero {
                    return Err(DescriptorError::InvalidNumber {
                        anim: anim.name.clone(),
                        field: field.to_string(),
                        value: "0".to_string(),
                    });
                }
            }

            if anim.index >= 0 {
                if let Some(prev) = by_index.insert(anim.index, pos) {
                    return Err(DescriptorError::DuplicateIndex {
                        index: anim.index,
                        first: animations[prev].name.clone(),
                        second: anim.name.clone(),
                    });
                }
                if let Some(expected) = registry.expected_name(anim.index) {
                    if expected != anim.name {
                        return Err(DescriptorError::WrongIndexName {
                            index: anim.index,
                            expected: expected.to_string(),
                            found: anim.name.clone(),
                        });
                    }
                }
            }
        }

        let descriptor = Self { shadow_size, animations, by_name, by_index };
        descriptor.check_aliases()?;
        Ok(descriptor)
    }

    fn check_aliases(&self) -> Result<(), DescriptorError> {
        for anim in &self.animations {
            let mut seen = BTreeSet::new();
            let mut current = anim;
            while let Some(target) = &current.alias_of {
                if !seen.insert(current.name.to_lowercase()) {
                    return Err(DescriptorError::AliasCycle(anim.name.clone()));
                }
                current = self.get(target).ok_or_else(|| DescriptorError::DanglingAlias {
                    name: current.name.clone(),
                    target: target.clone(),
                })?;
            }
        }
        Ok(())
    }

    /// Entries in document order.
    pub fn animations(&self) -> &[AnimationDescriptor] {
        &self.animations
    }

    /// Entries that own sheets (not aliases).
    pub fn concrete(&self) -> impl Iterator<Item = &AnimationDescriptor> {
        self.animations.iter().filter(|a| !a.is_alias())
    }

    /// Look up an entry by name, ignoring case.
    pub fn get(&self, name: &str) -> Option<&AnimationDescriptor> {
        self.by_name.get(&name.to_lowercase()).map(|pos| &self.animations[*pos])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(&name.to_lowercase())
    }

    /// Look up an entry by numeric slot.
    pub fn at_index(&self, index: i32) -> Option<&AnimationDescriptor> {
        self.by_index.get(&index).map(|pos| &self.animations[*pos])
    }

    /// Follow `CopyOf` links to the entry that owns the sheets.
    pub fn resolve(&self, name: &str) -> Option<&AnimationDescriptor> {
        let mut current = self.get(name)?;
        // Cycles are rejected at construction, so this terminates.
        while let Some(target) = &current.alias_of {
            current = self.get(target)?;
        }
        Some(current)
    }

    /// lowercase name -> index, the name lookup table of the document.
    pub fn name_index(&self) -> BTreeMap<String, i32> {
        self.by_name.iter().map(|(name, pos)| (name.clone(), self.animations[*pos].index)).collect()
    }

    /// Emit the document in the `AnimData` shape.
    pub fn serialize(&self) -> Result<String, DescriptorError> {
        let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
        writer.write_event(Event::Decl(BytesDecl::new("1.0", None, None))).map_err(xml_error)?;
        open(&mut writer, "AnimData")?;
        text_element(&mut writer, "ShadowSize", &self.shadow_size.to_string())?;
        open(&mut writer, "Anims")?;
        for anim in &self.animations {
            open(&mut writer, "Anim")?;
            text_element(&mut writer, "Name", &anim.name)?;
            if anim.index >= 0 {
                text_element(&mut writer, "Index", &anim.index.to_string())?;
            }
            if let Some(target) = &anim.alias_of {
                text_element(&mut writer, "CopyOf", target)?;
            } else {
                if let Some((w, h)) = anim.frame_size {
                    text_element(&mut writer, "FrameWidth", &w.to_string())?;
                    text_element(&mut writer, "FrameHeight", &h.to_string())?;
                }
                for (field, frame) in anim.frame_events() {
                    text_element(&mut writer, field, &frame.to_string())?;
                }
                open(&mut writer, "Durations")?;
                for duration in &anim.durations {
                    text_element(&mut writer, "Duration", &duration.to_string())?;
                }
                close(&mut writer, "Durations")?;
            }
            close(&mut writer, "Anim")?;
        }
        close(&mut writer, "Anims")?;
        close(&mut writer, "AnimData")?;

        let mut out = String::from_utf8(writer.into_inner()).map_err(|_| DescriptorError::Encoding)?;
        out.push('\n');
        Ok(out)
    }
}

fn xml_error(e: impl std::fmt::Display) -> DescriptorError {
    DescriptorError::Xml(e.to_string())
}

fn open(writer: &mut Writer<Vec<u8>>, name: &str) -> Result<(), DescriptorError> {
    writer.write_event(Event::Start(BytesStart::new(name))).map_err(xml_error)
}

fn close(writer: &mut Writer<Vec<u8>>, name: &str) -> Result<(), DescriptorError> {
    writer.write_event(Event::End(BytesEnd::new(name))).map_err(xml_error)
}

/// `<name>text</name>` on one line; the text is escaped.
fn text_element(writer: &mut Writer<Vec<u8>>, name: &str, text: &str) -> Result<(), DescriptorError> {
    open(writer, name)?;
    writer.write_event(Event::Text(BytesText::new(text))).map_err(xml_error)?;
    close(writer, name)
}

/// Parse a descriptor document.
pub fn parse_descriptor(bytes: &[u8], registry: &AnimRegistry) -> Result<AnimDescriptor, DescriptorError> {
    AnimDescriptor::parse(bytes, registry)
}

/// Minimal element tree; attributes are not part of the format.
#[derive(Debug, Default)]
struct Element {
    name: String,
    text: String,
    children: Vec<Element>,
}

impl Element {
    fn named(name: &[u8]) -> Self {
        Self { name: String::from_utf8_lossy(name).into_owned(), ..Default::default() }
    }

    fn child(&self, name: &str) -> Option<&Element> {
        self.children.iter().find(|c| c.name == name)
    }

    /// Every descendant with the given name, in document order.
    fn collect<'a>(&'a self, name: &str, out: &mut Vec<&'a Element>) {
        for child in &self.children {
            if child.name == name {
                out.push(child);
            } else {
                child.collect(name, out);
            }
        }
    }
}

fn parse_tree(text: &str) -> Result<Element, DescriptorError> {
    let mut reader = Reader::from_str(text);
    reader.config_mut().trim_text(true);

    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;

    loop {
        let event = match reader.read_event() {
            Ok(event) => event,
            Err(e) => {
                return Err(DescriptorError::Xml(format!(
                    "at byte {}: {}",
                    reader.buffer_position(),
                    e
                )))
            }
        };
        match event {
            Event::Start(e) => stack.push(Element::named(e.name().as_ref())),
            Event::Empty(e) => attach(&mut stack, &mut root, Element::named(e.name().as_ref()))?,
            Event::End(_) => {
                let element = stack
                    .pop()
                    .ok_or_else(|| DescriptorError::Xml("unexpected closing tag".to_string()))?;
                attach(&mut stack, &mut root, element)?;
            }
            Event::Text(t) => {
                if let Some(top) = stack.last_mut() {
                    let raw = String::from_utf8_lossy(&t);
                    let unescaped = quick_xml::escape::unescape(&raw)
                        .map_err(|e| DescriptorError::Xml(e.to_string()))?;
                    top.text.push_str(&unescaped);
                }
            }
            Event::CData(c) => {
                if let Some(top) = stack.last_mut() {
                    top.text.push_str(&String::from_utf8_lossy(&c));
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if let Some(open) = stack.last() {
        return Err(DescriptorError::Xml(format!("unclosed <{}>", open.name)));
    }
    root.ok_or_else(|| DescriptorError::Xml("empty document".to_string()))
}

fn attach(
    stack: &mut [Element],
    root: &mut Option<Element>,
    element: Element,
) -> Result<(), DescriptorError> {
    match stack.last_mut() {
        Some(parent) => parent.children.push(element),
        None if root.is_none() => *root = Some(element),
        None => return Err(DescriptorError::Xml("multiple root elements".to_string())),
    }
    Ok(())
}

fn read_anim(element: &Element) -> Result<AnimationDescriptor, DescriptorError> {
    let name = element
        .child("Name")
        .map(|n| n.text.trim().to_string())
        .filter(|n| !n.is_empty())
        .ok_or(DescriptorError::MissingName)?;

    let number = |field: &str| -> Result<Option<i64>, DescriptorError> {
        match element.child(field) {
            None => Ok(None),
            Some(el) => el.text.trim().parse::<i64>().map(Some).map_err(|_| {
                DescriptorError::InvalidNumber {
                    anim: name.clone(),
                    field: field.to_string(),
                    value: el.text.trim().to_string(),
                }
            }),
        }
    };
    let invalid = |field: &str, value: i64| DescriptorError::InvalidNumber {
        anim: name.clone(),
        field: field.to_string(),
        value: value.to_string(),
    };
    let positive = |field: &str, value: i64| -> Result<u32, DescriptorError> {
        u32::try_from(value).ok().filter(|v| *v > 0).ok_or_else(|| invalid(field, value))
    };
    let event = |field: &str| -> Result<i32, DescriptorError> {
        match number(field)? {
            None => Ok(NO_FRAME),
            Some(v) => i32::try_from(v).ok().filter(|v| *v >= 0).ok_or_else(|| invalid(field, v)),
        }
    };

    let index = match number("Index")? {
        None => NO_FRAME,
        Some(v) => i32::try_from(v).ok().filter(|v| *v >= 0).ok_or_else(|| invalid("Index", v))?,
    };

    let alias_of = element.child("CopyOf").map(|c| c.text.trim().to_string());

    let frame_size = match (number("FrameWidth")?, number("FrameHeight")?) {
        (Some(w), Some(h)) => Some((positive("FrameWidth", w)?, positive("FrameHeight", h)?)),
        (None, None) => None,
        // Half a frame size is as unusable as none.
        _ if alias_of.is_some() => return Err(DescriptorError::AliasWithFrameData(name.clone())),
        _ => return Err(DescriptorError::MissingFrameSize(name.clone())),
    };

    let mut durations = Vec::new();
    if let Some(list) = element.child("Durations") {
        for d in list.children.iter().filter(|c| c.name == "Duration") {
            let value = d.text.trim().parse::<i64>().map_err(|_| DescriptorError::InvalidNumber {
                anim: name.clone(),
                field: "Duration".to_string(),
                value: d.text.trim().to_string(),
            })?;
            durations.push(positive("Duration", value)?);
        }
    }

    Ok(AnimationDescriptor {
        index,
        frame_size,
        durations,
        alias_of,
        rush_frame: event("RushFrame")?,
        hit_frame: event("HitFrame")?,
        return_frame: event("ReturnFrame")?,
        name,
    })
}
