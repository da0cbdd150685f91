//! Randomized check that trimming never drops an import the file refers to,
//! always drops the ones it provably does not, and settles after one pass.

use groovy_imports::{UnusedImportTrimmer, transform};
use pretty_assertions::assert_eq;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const NAMES: [&str; 10] = [
    "Alpha", "Beta", "Gamma", "Delta", "Omega", "max", "min", "PI", "abs", "Epsilon",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    Plain,
    Aliased,
    Static,
    StaticAliased,
    Wildcard,
    StaticWildcard,
}

struct GeneratedImport {
    kind: Kind,
    bound: &'static str,
    line: String,
}

/// How a body line mentions a name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mention {
    /// A bare reference that is not a call.
    Reference,
    /// `name(...)` with no receiver.
    Call,
    /// Comment, string or qualified access; never a reference.
    Inert,
}

fn pick<T: Copy>(rng: &mut StdRng, items: &[T]) -> T {
    items[rng.gen_range(0..items.len())]
}

fn generate_import(rng: &mut StdRng) -> GeneratedImport {
    let kinds = [
        Kind::Plain,
        Kind::Plain,
        Kind::Aliased,
        Kind::Static,
        Kind::StaticAliased,
        Kind::Wildcard,
        Kind::StaticWildcard,
    ];
    let kind = pick(rng, &kinds);
    let package = format!("p{}", rng.gen_range(0..3));
    let name = pick(rng, &NAMES);
    let alias = pick(rng, &NAMES);
    let (line, bound) = match kind {
        Kind::Plain => (format!("import {package}.{name}"), name),
        Kind::Aliased => (format!("import {package}.{name} as {alias}"), alias),
        Kind::Static => (format!("import static {package}.Util.{name}"), name),
        Kind::StaticAliased => (
            format!("import static {package}.Util.{name} as {alias}"),
            alias,
        ),
        Kind::Wildcard => (format!("import {package}.*"), ""),
        Kind::StaticWildcard => (format!("import static {package}.Util.*"), ""),
    };
    GeneratedImport { kind, bound, line }
}

fn generate_line(rng: &mut StdRng, index: usize) -> (String, &'static str, Mention) {
    let name = pick(rng, &NAMES);
    let (line, mention) = match rng.gen_range(0..10) {
        0 => (format!("{name} item{index} = null"), Mention::Reference),
        1 => (format!("def v{index} = new {name}()"), Mention::Reference),
        2 => (format!("println \"value: ${{{name}}}\""), Mention::Reference),
        3 => (format!("@{name}\nclass C{index} {{}}"), Mention::Reference),
        4 => (format!("{name}(1)"), Mention::Call),
        5 => (format!("def r{index} = {name}"), Mention::Reference),
        6 => (format!("def q{index} = obj.{name}"), Mention::Inert),
        7 => (format!("// {name} in a comment"), Mention::Inert),
        8 => (format!("def s{index} = '{name}'"), Mention::Inert),
        _ => (format!("/* {name} */"), Mention::Inert),
    };
    (line, name, mention)
}

fn must_keep(import: &GeneratedImport, mentions: &[(&str, Mention)]) -> bool {
    match import.kind {
        Kind::Wildcard | Kind::StaticWildcard => true,
        Kind::Plain => mentions
            .iter()
            .any(|&(name, mention)| name == import.bound && mention == Mention::Reference),
        Kind::Aliased | Kind::Static | Kind::StaticAliased => mentions
            .iter()
            .any(|&(name, mention)| name == import.bound && mention != Mention::Inert),
    }
}

#[test]
fn test_random_files_keep_exactly_the_referenced_imports_once() {
    let trimmer = UnusedImportTrimmer::default();

    for seed in 0..300u64 {
        let mut rng = StdRng::seed_from_u64(seed);
        let imports: Vec<_> = (0..rng.gen_range(1..8))
            .map(|_| generate_import(&mut rng))
            .collect();
        let body: Vec<_> = (0..rng.gen_range(0..10))
            .map(|index| generate_line(&mut rng, index))
            .collect();

        let mut body_text = String::new();
        for (line, _, _) in &body {
            body_text.push_str(line);
            body_text.push('\n');
        }
        let mut source = String::new();
        for import in &imports {
            source.push_str(&import.line);
            source.push('\n');
        }
        source.push('\n');
        source.push_str(&body_text);

        let mentions: Vec<_> = body.iter().map(|(_, name, mention)| (*name, *mention)).collect();
        let kept: Vec<_> = imports
            .iter()
            .filter(|import| must_keep(import, &mentions))
            .collect();

        let mut expected = String::new();
        for import in &kept {
            expected.push_str(&import.line);
            expected.push('\n');
        }
        if !kept.is_empty() {
            expected.push('\n');
        }
        expected.push_str(&body_text);

        let output = transform(&source);
        assert_eq!(output, expected, "seed {seed}, source:\n{source}");
        assert_eq!(transform(&output), output, "seed {seed}: not idempotent");

        // Nothing that was removed has a matching reference in the output.
        let analysis = trimmer
            .analyze(&output)
            .unwrap_or_else(|err| panic!("seed {seed}: output does not parse: {err}"));
        assert!(analysis.unused.is_empty(), "seed {seed}: {:?}", analysis.unused);
    }
}
