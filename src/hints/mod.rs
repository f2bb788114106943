//! Hint-definition model, loader and merge engine

mod loader;
mod merge;
mod pattern;
mod types;

pub use loader::{load_hint_model, parse_hint_source, HintDocument, LoadError, HINT_ROOT_TAG};
pub use merge::{attribute_snippet, build_model, element_snippet, merge_definition};
pub use pattern::{FileTrigger, ValuePattern};
pub use types::{
    CodeHint, ConditionalAttributeHint, FileClass, HintItem, HintKind, HintModel, LinkRule,
    MergeRule, NodeHintDefinition, ScriptTextHints, TextHint,
};

