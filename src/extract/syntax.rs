// Per-language syntax tables
//
// The extractors are shared across languages; everything that differs between
// them at the lexical level lives in one of these tables.

use crate::lang::Language;
use crate::model::Visibility;

/// Lexical and declaration-level traits of one language
#[derive(Debug)]
pub struct Syntax {
    pub language: Language,
    /// Line comment openers
    pub line_comments: &'static [&'static str],
    /// Supports `/* ... */` block comments
    pub block_comments: bool,
    /// String delimiters
    pub quotes: &'static [char],
    /// `#[...]` is an attribute, not a comment
    pub hash_attributes: bool,
    /// Keywords that set member visibility
    pub visibility_keywords: &'static [&'static str],
    /// Keywords that are member or type modifiers
    pub modifier_keywords: &'static [&'static str],
    /// Visibility of members declared without a keyword
    pub default_visibility: Visibility,
    /// Self reference used for member access
    pub self_refs: &'static [&'static str],
    /// Every sync call gets an implicit return message
    pub implicit_returns: bool,
    /// Calls prefixed by `await` are asynchronous messages
    pub await_is_async: bool,
}

pub static CSHARP: Syntax = Syntax {
    language: Language::CSharp,
    // preprocessor directives carry no structure
    line_comments: &["//", "#region", "#endregion", "#pragma", "#nullable", "#if", "#else", "#elif", "#endif"],
    block_comments: true,
    quotes: &['"', '\''],
    hash_attributes: false,
    visibility_keywords: &["public", "private", "protected", "internal"],
    modifier_keywords: &[
        "static", "abstract", "virtual", "override", "sealed", "readonly", "async", "const",
        "partial", "extern", "new", "volatile", "unsafe", "required",
    ],
    default_visibility: Visibility::Private,
    self_refs: &["this"],
    implicit_returns: false,
    await_is_async: false,
};

pub static JAVA: Syntax = Syntax {
    language: Language::Java,
    line_comments: &["//"],
    block_comments: true,
    quotes: &['"', '\''],
    hash_attributes: false,
    visibility_keywords: &["public", "private", "protected"],
    modifier_keywords: &[
        "static", "abstract", "final", "synchronized", "native", "transient", "volatile",
        "default", "strictfp", "sealed", "non-sealed",
    ],
    default_visibility: Visibility::Package,
    self_refs: &["this"],
    implicit_returns: true,
    await_is_async: false,
};

pub static PYTHON: Syntax = Syntax {
    language: Language::Python,
    line_comments: &["#"],
    block_comments: false,
    quotes: &['"', '\''],
    hash_attributes: false,
    visibility_keywords: &[],
    modifier_keywords: &["async"],
    default_visibility: Visibility::Public,
    self_refs: &["self", "cls"],
    implicit_returns: true,
    await_is_async: false,
};

pub static PHP: Syntax = Syntax {
    language: Language::Php,
    line_comments: &["//", "#"],
    block_comments: true,
    quotes: &['"', '\''],
    hash_attributes: true,
    visibility_keywords: &["public", "private", "protected", "var"],
    modifier_keywords: &["static", "abstract", "final", "readonly"],
    default_visibility: Visibility::Public,
    self_refs: &["$this", "self", "static"],
    implicit_returns: true,
    await_is_async: false,
};

pub static JAVASCRIPT: Syntax = Syntax {
    language: Language::JavaScript,
    line_comments: &["//"],
    block_comments: true,
    quotes: &['"', '\'', '`'],
    hash_attributes: false,
    visibility_keywords: &["public", "private", "protected"],
    modifier_keywords: &[
        "static", "abstract", "async", "readonly", "override", "declare", "get", "set",
    ],
    default_visibility: Visibility::Public,
    self_refs: &["this"],
    implicit_returns: false,
    await_is_async: true,
};

/// Syntax table for a language
pub fn syntax_for(language: Language) -> &'static Syntax {
    match language {
        Language::CSharp => &CSHARP,
        Language::Java => &JAVA,
        Language::Python => &PYTHON,
        Language::Php => &PHP,
        Language::JavaScript => &JAVASCRIPT,
    }
}

impl Syntax {
    pub fn visibility_of(&self, word: &str) -> Option<Visibility> {
        if !self.visibility_keywords.contains(&word) {
            return None;
        }
        // PHP `var` is a public property
        if word == "var" {
            return Some(Visibility::Public);
        }
        Visibility::from_keyword(word)
    }

    pub fn is_modifier(&self, word: &str) -> bool {
        self.modifier_keywords.contains(&word)
    }

    pub fn is_self_ref(&self, word: &str) -> bool {
        self.self_refs.contains(&word)
    }

    /// Member access operator
    pub fn member_access(&self) -> &'static str {
        match self.language {
            Language::Php => "->",
            _ => ".",
        }
    }
}
