//! The dynq command-line driver.
//!
//! Parses an expression against declared parameters and prints the typed
//! tree, or renders the parse error against the source:
//!
//! ```text
//! dynqc 'x.Length == 4' --param x:String
//! dynqc 'it == MyEnum.Yes' --it Int32 --allow 'MyEnum{Yes=0,No=1}'
//! ```

use std::process;

use clap::Parser as ClapParser;

use dynq::{builtins, diagnostics, parse, parse_lambda, EnumDef, Param, ParseOptions, Ty};

#[derive(ClapParser)]
#[command(name = "dynqc", version, about = "Parse a dynq expression")]
struct Cli {
    /// The expression to parse
    expression: String,

    /// Named parameters, as `name:TypeName` (e.g. `x:String`)
    #[arg(short, long = "param")]
    params: Vec<String>,

    /// Declare an anonymous `it` parameter of the given type
    #[arg(long = "it")]
    it: Option<String>,

    /// Extra allowed types: a known type name, or an inline enum
    /// declaration like `MyEnum{Yes=0,No=1}`
    #[arg(long = "allow")]
    allow: Vec<String>,

    /// Require the expression to have this result type
    #[arg(long)]
    result: Option<String>,
}

fn main() {
    let cli = Cli::parse();
    if let Err(message) = run(&cli) {
        eprintln!("error: {message}");
        process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<(), String> {
    // Types named on the command line resolve against the predefined
    // set plus everything declared through --allow, in order.
    let mut types = builtins::default_allowed_types();
    let mut opts = ParseOptions::new();
    for decl in &cli.allow {
        let ty = allowed_type(decl, &types)?;
        opts = opts.allow(ty.clone());
        types.push(ty);
    }

    let mut params = Vec::new();
    for decl in &cli.params {
        let (name, ty) = decl
            .split_once(':')
            .ok_or_else(|| format!("parameter `{decl}` is not of the form name:Type"))?;
        params.push(Param::new(name, resolve_type(ty, &types)?));
    }
    if let Some(ty) = &cli.it {
        params.push(Param::new("", resolve_type(ty, &types)?));
    }
    let result_ty = cli
        .result
        .as_deref()
        .map(|name| resolve_type(name, &types))
        .transpose()?;

    let parsed = if params.is_empty() {
        parse(&cli.expression, result_ty.as_ref(), &opts)
    } else {
        parse_lambda(&params, result_ty.as_ref(), &cli.expression, &opts)
    };

    match parsed {
        Ok(expr) => {
            println!("{expr}");
            println!(": {}", expr.ty());
            Ok(())
        }
        Err(err) => {
            eprint!("{}", diagnostics::render(&err, &cli.expression));
            process::exit(1);
        }
    }
}

/// An `--allow` declaration: an enum body mints a fresh enum type; a
/// bare name re-allows a type already known by name.
fn allowed_type(decl: &str, types: &[Ty]) -> Result<Ty, String> {
    let Some((name, body)) = decl.split_once('{') else {
        return resolve_type(decl, types);
    };
    let body = body
        .strip_suffix('}')
        .ok_or_else(|| format!("enum declaration `{decl}` is missing a closing brace"))?;
    let mut members = Vec::new();
    let mut next = 0i64;
    for part in body.split(',') {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }
        let (member, value) = match part.split_once('=') {
            Some((member, value)) => {
                let value: i64 = value.trim().parse().map_err(|_| {
                    format!("enum member `{part}` has a non-integer value")
                })?;
                (member.trim(), value)
            }
            None => (part, next),
        };
        next = value + 1;
        members.push((member.to_string(), value));
    }
    if members.is_empty() {
        return Err(format!("enum declaration `{decl}` has no members"));
    }
    Ok(EnumDef::define(name.trim(), members))
}

/// Resolve a type by short name against the known set.
fn resolve_type(name: &str, types: &[Ty]) -> Result<Ty, String> {
    types
        .iter()
        .find(|t| t.name().eq_ignore_ascii_case(name))
        .cloned()
        .ok_or_else(|| format!("unknown type `{name}`"))
}
