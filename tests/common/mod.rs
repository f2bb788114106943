//! Shared workspace fixture
#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub const HINTS: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<HacknetEditorHint>
  <Node name="Computer" desc="A computer node">
    <Attribute name="id" required="true" desc="Unique id" />
    <Attribute name="ip" />
    <Attribute name="type" diag="W" desc="Security level">
      <Enums>
        <Enum desc="Corporate">1</Enum>
        <Enum desc="Home">2</Enum>
      </Enums>
    </Attribute>
  </Node>
  <Node name="Computer.portal">
    <Attribute name="request" hint="step" diag="W">
      <Step value="GET " desc="fetch"><Next hint="enum"><Enums><Enum>/a</Enum><Enum>/b</Enum></Enums></Next></Step>
      <Step value="POST " desc="send"><Next hint="enum"><Enums><Enum>/a</Enum><Enum>/b</Enum></Enums></Next></Step>
    </Attribute>
  </Node>
  <Node name="Computer.file">
    <Attribute name="path" hint="path" diag="E">Music/**/*.ogg</Attribute>
  </Node>
  <Node name="mission" />
  <Node name="mission.goals" />
  <Node name="mission.goals.goal">
    <Attribute name="target" hint="Computer" diag="E" linkBy="Computer.id" />
  </Node>
</HacknetEditorHint>
"#;

pub const MISSION: &str = r#"<mission><goals><goal target="core"/></goals></mission>"#;

/// A workspace with the hint file, one computer and one mission
pub fn workspace() -> TempDir {
    let temp = TempDir::new().unwrap();
    write(temp.path(), "Hacknet-EditorHint.xml", HINTS);
    write(temp.path(), "Nodes/core.xml", r#"<Computer id="core" ip="10.0.0.1" type="1"/>"#);
    write(temp.path(), "Missions/m.xml", MISSION);
    temp
}

pub fn write(root: &Path, relative: &str, text: &str) -> PathBuf {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, text).unwrap();
    path
}
