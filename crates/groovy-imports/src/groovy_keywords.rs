use once_cell::sync::Lazy;
use rustc_hash::FxHashSet;

/// Reserved words of Groovy. Contextual words (`var`, `record`, `yield`,
/// `sealed`, `permits`) are deliberately absent: they stay identifiers so
/// they can still count as references.
static KEYWORDS: Lazy<FxHashSet<&'static str>> = Lazy::new(|| {
    let mut keywords = FxHashSet::default();
    // Declarations
    keywords.insert("package");
    keywords.insert("import");
    keywords.insert("class");
    keywords.insert("interface");
    keywords.insert("enum");
    keywords.insert("trait");
    keywords.insert("extends");
    keywords.insert("implements");
    keywords.insert("throws");
    keywords.insert("def");
    keywords.insert("as");
    keywords.insert("in");
    // Modifiers
    keywords.insert("abstract");
    keywords.insert("final");
    keywords.insert("native");
    keywords.insert("private");
    keywords.insert("protected");
    keywords.insert("public");
    keywords.insert("static");
    keywords.insert("strictfp");
    keywords.insert("synchronized");
    keywords.insert("threadsafe");
    keywords.insert("transient");
    keywords.insert("volatile");
    keywords.insert("default");
    // Primitive types
    keywords.insert("boolean");
    keywords.insert("byte");
    keywords.insert("char");
    keywords.insert("double");
    keywords.insert("float");
    keywords.insert("int");
    keywords.insert("long");
    keywords.insert("short");
    keywords.insert("void");
    // Control flow
    keywords.insert("assert");
    keywords.insert("break");
    keywords.insert("case");
    keywords.insert("catch");
    keywords.insert("continue");
    keywords.insert("do");
    keywords.insert("else");
    keywords.insert("finally");
    keywords.insert("for");
    keywords.insert("goto");
    keywords.insert("if");
    keywords.insert("return");
    keywords.insert("switch");
    keywords.insert("throw");
    keywords.insert("try");
    keywords.insert("while");
    keywords.insert("const");
    // Expressions
    keywords.insert("instanceof");
    keywords.insert("new");
    keywords.insert("super");
    keywords.insert("this");
    keywords.insert("true");
    keywords.insert("false");
    keywords.insert("null");
    keywords
});

/// Operators and punctuation, longest first so the tokenizer can match by
/// maximal munch.
static OPERATORS: Lazy<Vec<&'static str>> = Lazy::new(|| {
    let mut operators = vec![
        ">>>=", "...", "..<", "<..", "<=>", "===", "!==", "**=", "<<=", ">>=", ">>>",
        "?.", "*.", ".&", ".@", "::", "->", "?:", "..", "++", "--", "==", "!=", "<=", ">=",
        "&&", "||", "+=", "-=", "*=", "/=", "%=", "&=", "|=", "^=", "**", "<<", ">>", "=~", "==~",
        "{", "}", "(", ")", "[", "]", ";", ",", ".", ":", "?", "!", "~", "+", "-", "*", "/", "%",
        "=", "<", ">", "&", "|", "^", "@", "\\",
    ];
    operators.sort_by_key(|op| std::cmp::Reverse(op.len()));
    operators
});

pub fn is_keyword(word: &str) -> bool {
    KEYWORDS.contains(word)
}

/// Return the operator table ordered longest first.
pub fn operators() -> &'static [&'static str] {
    &OPERATORS
}

/// Keywords that open a type declaration.
pub fn is_type_declaration_keyword(word: &str) -> bool {
    matches!(word, "class" | "interface" | "enum" | "trait")
}

/// Declaration modifiers that may precede a type declaration keyword.
pub fn is_modifier(word: &str) -> bool {
    matches!(
        word,
        "abstract"
            | "final"
            | "private"
            | "protected"
            | "public"
            | "static"
            | "strictfp"
            | "sealed"
            | "non"
            | "transient"
            | "volatile"
            | "synchronized"
            | "default"
    )
}

/// Keywords after which the next identifier names a type.
pub fn introduces_type(word: &str) -> bool {
    matches!(
        word,
        "new" | "extends" | "implements" | "instanceof" | "as" | "throws" | "class" | "interface"
            | "enum" | "trait" | "record"
    )
}

/// Operators after which an identifier is qualified by a receiver.
pub fn is_member_access(op: &str) -> bool {
    matches!(op, "." | "?." | "*." | ".&" | ".@" | "::")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contextual_words_are_identifiers() {
        assert!(is_keyword("import"));
        assert!(is_keyword("def"));
        assert!(!is_keyword("var"));
        assert!(!is_keyword("record"));
        assert!(!is_keyword("List"));
    }

    #[test]
    fn test_operators_longest_first() {
        let ops = operators();
        let pos = |needle: &str| ops.iter().position(|op| *op == needle).unwrap();
        assert!(pos(">>>=") < pos(">>"));
        assert!(pos("?.") < pos("?"));
        assert!(pos("...") < pos(".."));
        assert!(pos("..") < pos("."));
    }
}
