//! Container renderer
//!
//! Wraps program text in a model file NetLogo can open. Widget records and
//! info text come from outside the compiler and are embedded as given.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Output container
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContainerFormat {
    /// XML model file (NetLogo 7)
    #[default]
    Nlogox,
    /// Legacy section-separated model file
    Nlogo,
    /// Program text only
    Code,
}

impl ContainerFormat {
    /// File extension, without the dot
    pub fn extension(&self) -> &'static str {
        match self {
            ContainerFormat::Nlogox => "nlogox",
            ContainerFormat::Nlogo => "nlogo",
            ContainerFormat::Code => "nls",
        }
    }
}

impl fmt::Display for ContainerFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContainerFormat::Nlogox => f.write_str("nlogox"),
            ContainerFormat::Nlogo => f.write_str("nlogo"),
            ContainerFormat::Code => f.write_str("code"),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown output format '{0}' (expected nlogox, nlogo or code)")]
pub struct UnknownFormat(pub String);

impl FromStr for ContainerFormat {
    type Err = UnknownFormat;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "nlogox" => Ok(ContainerFormat::Nlogox),
            "nlogo" => Ok(ContainerFormat::Nlogo),
            "code" | "nls" => Ok(ContainerFormat::Code),
            other => Err(UnknownFormat(other.to_string())),
        }
    }
}

/// Opaque data embedded next to the program
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachments {
    /// Widget records in the target container's own syntax
    pub widgets: Vec<String>,
    /// Info tab text
    pub info: Option<String>,
    /// Add `setup` and `go` buttons
    pub default_widgets: bool,
}

impl Default for Attachments {
    fn default() -> Self {
        Self {
            widgets: Vec::new(),
            info: None,
            default_widgets: true,
        }
    }
}

const NLOGOX_VERSION: &str = "NetLogo 7.0.0";
const NLOGO_VERSION: &str = "NetLogo 6.4.0";
const SECTION_SEPARATOR: &str = "@#$#@#$#@";

/// Render the model file for `program`
pub fn render_document(program: &str, attachments: &Attachments, format: ContainerFormat) -> String {
    match format {
        ContainerFormat::Nlogox => render_nlogox(program, attachments),
        ContainerFormat::Nlogo => render_nlogo(program, attachments),
        ContainerFormat::Code => program.to_string(),
    }
}

fn render_nlogox(program: &str, attachments: &Attachments) -> String {
    let mut out = String::new();
    out.push_str("<?xml version=\"1.0\" encoding=\"utf-8\"?>\n");
    out.push_str(&format!(
        "<model version=\"{}\" snapToGrid=\"true\">\n",
        NLOGOX_VERSION
    ));
    out.push_str(&format!("  <code>{}</code>\n", cdata(program)));

    out.push_str("  <widgets>\n");
    out.push_str(
        "    <view x=\"210\" y=\"10\" width=\"430\" height=\"430\" patchSize=\"13.0\" \
         fontSize=\"10\" minPxcor=\"-16\" maxPxcor=\"16\" minPycor=\"-16\" maxPycor=\"16\" \
         wrappingAllowedX=\"true\" wrappingAllowedY=\"true\" updateMode=\"1\" \
         showTickCounter=\"true\" tickCounterLabel=\"ticks\" frameRate=\"30.0\"></view>\n",
    );
    if attachments.default_widgets {
        out.push_str(
            "    <button x=\"10\" y=\"10\" height=\"30\" width=\"90\" forever=\"false\" kind=\"Observer\">setup</button>\n",
        );
        out.push_str(
            "    <button x=\"110\" y=\"10\" height=\"30\" width=\"90\" forever=\"true\" kind=\"Observer\">go</button>\n",
        );
    }
    for widget in &attachments.widgets {
        out.push_str(&format!("    {}\n", widget.trim()));
    }
    out.push_str("  </widgets>\n");

    if let Some(info) = &attachments.info {
        out.push_str(&format!("  <info>{}</info>\n", cdata(info)));
    }
    out.push_str("</model>\n");
    out
}

/// CDATA section; `]]>` inside the text is split across two sections
fn cdata(text: &str) -> String {
    format!("<![CDATA[{}]]>", text.replace("]]>", "]]]]><![CDATA[>"))
}

fn render_nlogo(program: &str, attachments: &Attachments) -> String {
    let mut interface = vec![GRAPHICS_WINDOW.to_string()];
    if attachments.default_widgets {
        interface.push(legacy_button(10, 10, "setup", false));
        interface.push(legacy_button(110, 10, "go", true));
    }
    interface.extend(attachments.widgets.iter().map(|w| w.trim().to_string()));

    let sections = [
        program.trim_end().to_string(),
        interface.join("\n\n"),
        attachments.info.clone().unwrap_or_default(),
        DEFAULT_TURTLE_SHAPE.to_string(),
        NLOGO_VERSION.to_string(),
        String::new(),
        String::new(),
        String::new(),
        String::new(),
        DEFAULT_LINK_SHAPE.to_string(),
        "0".to_string(),
        String::new(),
    ];
    let separator = format!("\n{}\n", SECTION_SEPARATOR);
    let mut out = sections.join(&separator);
    out.push('\n');
    out
}

fn legacy_button(x: u32, y: u32, command: &str, forever: bool) -> String {
    [
        "BUTTON".to_string(),
        x.to_string(),
        y.to_string(),
        (x + 90).to_string(),
        (y + 30).to_string(),
        "NIL".to_string(),
        command.to_string(),
        if forever { "T" } else { "NIL" }.to_string(),
        "1".to_string(),
        "T".to_string(),
        "OBSERVER".to_string(),
        "NIL".to_string(),
        "NIL".to_string(),
        "NIL".to_string(),
        "NIL".to_string(),
        "1".to_string(),
    ]
    .join("\n")
}

const GRAPHICS_WINDOW: &str = "GRAPHICS-WINDOW
210
10
647
448
-1
-1
13.0
1
10
1
1
1
0
1
1
1
-16
16
-16
16
0
0
1
ticks
30.0";

const DEFAULT_TURTLE_SHAPE: &str = "default
true
0
Polygon -7500403 true true 150 5 40 250 150 205 260 250";

const DEFAULT_LINK_SHAPE: &str = "default
0.0
-0.2 0 0.0 1.0
0.0 1 1.0 0.0
0.2 0 0.0 1.0
link direction
true
0
Line -7500403 true 150 150 90 180
Line -7500403 true 150 150 210 180";

#[cfg(test)]
mod tests {
    use super::*;

    const PROGRAM: &str = "to setup\n  clear-all\n  reset-ticks\nend\n";

    #[test]
    fn test_nlogox_wraps_code_and_default_buttons() {
        let doc = render_document(PROGRAM, &Attachments::default(), ContainerFormat::Nlogox);
        assert!(doc.starts_with("<?xml version=\"1.0\" encoding=\"utf-8\"?>\n<model "));
        assert!(doc.contains("<code><![CDATA[to setup\n  clear-all\n  reset-ticks\nend\n]]></code>"));
        assert!(doc.contains("forever=\"false\" kind=\"Observer\">setup</button>"));
        assert!(doc.contains("forever=\"true\" kind=\"Observer\">go</button>"));
        assert!(!doc.contains("<info>"));
        assert!(doc.ends_with("</model>\n"));
    }

    #[test]
    fn test_nlogox_embeds_attachments_verbatim() {
        let attachments = Attachments {
            widgets: vec!["<slider x=\"10\" y=\"50\" variable=\"rate\"/>".to_string()],
            info: Some("## WHAT IS IT?\nA <b>test</b> ]]> model".to_string()),
            default_widgets: false,
        };
        let doc = render_document(PROGRAM, &attachments, ContainerFormat::Nlogox);
        assert!(!doc.contains("<button"));
        assert!(doc.contains("    <slider x=\"10\" y=\"50\" variable=\"rate\"/>\n"));
        assert!(doc.contains("<info><![CDATA[## WHAT IS IT?\nA <b>test</b> ]]]]><![CDATA[> model]]></info>"));
    }

    #[test]
    fn test_nlogo_sections() {
        let doc = render_document(PROGRAM, &Attachments::default(), ContainerFormat::Nlogo);
        let sections: Vec<&str> = doc.split("\n@#$#@#$#@\n").collect();
        assert_eq!(sections.len(), 12);
        assert_eq!(sections[0], PROGRAM.trim_end());
        assert!(sections[1].starts_with("GRAPHICS-WINDOW"));
        assert!(sections[1].contains("BUTTON\n10\n10\n100\n40\nNIL\nsetup\nNIL\n"));
        assert!(sections[1].contains("BUTTON\n110\n10\n200\n40\nNIL\ngo\nT\n"));
        assert_eq!(sections[4], NLOGO_VERSION);
    }

    #[test]
    fn test_code_format_and_parsing() {
        assert_eq!(
            render_document(PROGRAM, &Attachments::default(), ContainerFormat::Code),
            PROGRAM
        );
        assert_eq!("NLOGO".parse::<ContainerFormat>().unwrap(), ContainerFormat::Nlogo);
        assert_eq!("code".parse::<ContainerFormat>().unwrap().extension(), "nls");
        assert!("xml".parse::<ContainerFormat>().is_err());
    }
}
