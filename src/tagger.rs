use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TagKey {
    Path,
    Ext,
    File,
    Dir,
}

impl TagKey {
    pub fn as_str(self) -> &'static str {
        match self {
            TagKey::Path => "path",
            TagKey::Ext => "ext",
            TagKey::File => "file",
            TagKey::Dir => "dir",
        }
    }
}

impl fmt::Display for TagKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathTag {
    pub key: TagKey,
    pub value: String,
}

impl PathTag {
    fn new(key: TagKey, value: &str) -> Self {
        Self {
            key,
            value: value.to_string(),
        }
    }
}

/// Derive the searchable tags of a canonical path.
///
/// Order: `path`, then `ext` (text after the last `.` of the final
/// component, if any), then `file` for the final component, then one `dir`
/// per ancestor from the nearest upwards. A leading component that is not
/// preceded by `/` (relative input) is reported as a `dir` as well.
///
/// `/a/b/c.txt` -> path=/a/b/c.txt, ext=txt, file=c.txt, dir=b, dir=a
pub fn derive_tags(path: &str) -> Vec<PathTag> {
    let mut tags = vec![PathTag::new(TagKey::Path, path)];

    let last = match path.rfind('/') {
        Some(i) => &path[i + 1..],
        None => path,
    };
    if let Some(dot) = last.rfind('.') {
        tags.push(PathTag::new(TagKey::Ext, &last[dot + 1..]));
    }

    let mut rest = path;
    let mut key = TagKey::File;
    while let Some(i) = rest.rfind('/') {
        tags.push(PathTag::new(key, &rest[i + 1..]));
        key = TagKey::Dir;
        rest = &rest[..i];
    }

    if !rest.is_empty() {
        tags.push(PathTag::new(TagKey::Dir, rest));
    }

    tags
}
