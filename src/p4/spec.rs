//! Client workspace spec forms, as read by `p4 client -i`.

use std::fmt::Write as _;
use std::path::PathBuf;

/// `LineEnd:` field of a client spec
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineEnd {
    /// Platform convention of the machine running the sync
    #[default]
    Local,
    Unix,
    Win,
}

impl LineEnd {
    pub fn as_str(self) -> &'static str {
        match self {
            LineEnd::Local => "local",
            LineEnd::Unix => "unix",
            LineEnd::Win => "win",
        }
    }
}

/// `Options:` field of a client spec
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientOptions {
    pub allwrite: bool,
    pub clobber: bool,
    pub compress: bool,
    pub locked: bool,
    pub modtime: bool,
    pub rmdir: bool,
}

impl ClientOptions {
    pub fn render(&self) -> String {
        let flag = |on: bool, name: &str| {
            if on {
                name.to_string()
            } else {
                format!("no{name}")
            }
        };

        [
            flag(self.allwrite, "allwrite"),
            flag(self.clobber, "clobber"),
            flag(self.compress, "compress"),
            if self.locked { "locked" } else { "unlocked" }.to_string(),
            flag(self.modtime, "modtime"),
            if self.rmdir { "rmdir" } else { "normdir" }.to_string(),
        ]
        .join(" ")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientSpec {
    pub name: String,
    pub owner: String,
    pub root: PathBuf,
    pub stream: String,
    pub options: ClientOptions,
    pub line_end: LineEnd,
    pub description: String,
}

impl ClientSpec {
    /// Render the spec form. The view is left out; the server derives it
    /// from the stream.
    pub fn to_form(&self) -> String {
        let mut form = String::new();
        let _ = writeln!(form, "Client:\t{}", self.name);
        let _ = writeln!(form, "Owner:\t{}", self.owner);
        form.push_str("Description:\n");
        for line in self.description.lines() {
            let _ = writeln!(form, "\t{line}");
        }
        let _ = writeln!(form, "Root:\t{}", self.root.display());
        let _ = writeln!(form, "Options:\t{}", self.options.render());
        let _ = writeln!(form, "LineEnd:\t{}", self.line_end.as_str());
        let _ = writeln!(form, "Stream:\t{}", self.stream);
        form
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options(allwrite: bool) -> ClientOptions {
        ClientOptions {
            allwrite,
            clobber: true,
            compress: true,
            locked: false,
            modtime: true,
            rmdir: false,
        }
    }

    #[test]
    fn test_options_render() {
        assert_eq!(
            options(false).render(),
            "noallwrite clobber compress unlocked modtime normdir"
        );
        assert_eq!(
            options(true).render(),
            "allwrite clobber compress unlocked modtime normdir"
        );
    }

    #[test]
    fn test_form_fields() {
        let spec = ClientSpec {
            name: "temp_sync_build01_42".to_string(),
            owner: "alice".to_string(),
            root: PathBuf::from("/ws/dev"),
            stream: "//main/dev".to_string(),
            options: options(false),
            line_end: LineEnd::Local,
            description: "Ephemeral sync workspace.\nSafe to delete.".to_string(),
        };

        let form = spec.to_form();
        assert!(form.starts_with("Client:\ttemp_sync_build01_42\n"));
        assert!(form.contains("Owner:\talice\n"));
        assert!(form.contains("Description:\n\tEphemeral sync workspace.\n\tSafe to delete.\n"));
        assert!(form.contains("Root:\t/ws/dev\n"));
        assert!(form.contains("LineEnd:\tlocal\n"));
        assert!(form.contains("Stream:\t//main/dev\n"));
        assert!(!form.contains("View:"));
    }
}
