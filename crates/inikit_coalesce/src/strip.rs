//! Editor-only content stripping for coalesced localization.
//!
//! Cooked packages carry subtitle data inside their sound assets, so the
//! coalesced localization files can drop the editor-facing fields: recording
//! scripts, localization comments, default-valued flags, the subtitle arrays
//! themselves, and whole sound-node sections.

use inikit_config::ConfigFile;

/// Drop editor-only pair lines from localization text: `SpokenText="..."`
/// and `Comment="..."` fields, and `bMature`/`bManualWordWrap` flags stuck
/// at their `False` default.
pub fn strip_editor_only_lines(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for line in text.lines() {
        if line.len() >= 4 {
            if line.trim_end().ends_with('"') {
                if line.contains("SpokenText=\"") || line.contains("Comment=\"") {
                    continue;
                }
            } else if line.contains("bMature=False") || line.contains("bManualWordWrap=False") {
                continue;
            }
        }
        out.push_str(line);
        out.push('\n');
    }
    out
}

/// Drop sound-node section headers and subtitle-array lines.
pub fn strip_subtitle_lines(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for line in text.lines() {
        if line.len() >= 4 && (line.contains(" SoundNodeWave]") || line.contains("Subtitles[")) {
            continue;
        }
        out.push_str(line);
        out.push('\n');
    }
    out
}

/// Remove every parsed section belonging to a sound-node asset.
pub fn strip_sound_node_wave_sections(file: &mut ConfigFile) {
    let doomed: Vec<String> = file
        .section_names()
        .iter()
        .filter(|name| name.contains(" SoundNodeWave"))
        .map(|name| name.to_string())
        .collect();
    for name in doomed {
        file.remove_section(&name);
    }
}
