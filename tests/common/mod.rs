#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tagflow::codec::{CodecHandle, CodecRegistry};
use tagflow::record::Record;
use tagflow::stage::Stage;

pub fn json_codec() -> CodecHandle {
    CodecRegistry::default().get("json").unwrap()
}

pub fn write_stage(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, body).unwrap();
    path
}

pub fn stage_at(path: impl Into<PathBuf>) -> Arc<Stage> {
    Arc::new(Stage::new(path, json_codec(), None))
}

pub fn record(json: &str) -> Record {
    serde_json::from_str(json).unwrap()
}

fn tag_list(tags: &[&str]) -> String {
    tags.iter()
        .map(|t| format!("\"{t}\""))
        .collect::<Vec<_>>()
        .join(",")
}

pub fn descriptor_json(name: &str, input_tags: &[&str], output_tags: &[&str]) -> String {
    format!(
        r#"{{"name":"{name}","input_tags":[{}],"output_tags":[{}]}}"#,
        tag_list(input_tags),
        tag_list(output_tags),
    )
}

/// Shell stage that only answers `config`; `process` and `start` succeed
/// with no output.
pub fn descriptor_stage(name: &str, input_tags: &[&str], output_tags: &[&str]) -> String {
    format!(
        "#!/bin/sh\n\
         case \"$1\" in\n\
           config) echo '{}' ;;\n\
         esac\n",
        descriptor_json(name, input_tags, output_tags),
    )
}

/// Shell stage that, on `process`, echoes every stdin record containing one
/// of its input tags with the whole tags array replaced by `[output_tag]`.
/// Records it does not recognise are consumed silently.
pub fn rewrite_stage(name: &str, input_tags: &[&str], output_tag: &str) -> String {
    assert!(!input_tags.is_empty(), "rewrite stages need input tags");
    let patterns = input_tags
        .iter()
        .map(|t| format!("*'\"{t}\"'*"))
        .collect::<Vec<_>>()
        .join("|");

    format!(
        "#!/bin/sh\n\
         case \"$1\" in\n\
           config)\n\
             echo '{descriptor}'\n\
             ;;\n\
           process)\n\
             while IFS= read -r line || [ -n \"$line\" ]; do\n\
               case \"$line\" in\n\
                 {patterns})\n\
                   printf '%s\\n' \"$line\" | sed 's/\"tags\":\\[[^]]*\\]/\"tags\":[\"{output_tag}\"]/'\n\
                   ;;\n\
               esac\n\
             done\n\
             ;;\n\
         esac\n",
        descriptor = descriptor_json(name, input_tags, &[output_tag]),
    )
}
