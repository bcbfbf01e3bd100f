//! Rules of the Zeus language

use crate::grammar::{
    Grammar, Rule, alias, field, optional, pattern, prec, prec_dynamic, prec_left, repeat, sym, token,
    token_immediate,
};
use crate::{choice, seq};

/// Precedence levels, loosest last.
mod level {
    pub const FIELD: i32 = 14;
    pub const MULTIPLICATIVE: i32 = 10;
    pub const ADDITIVE: i32 = 9;
    pub const SHIFT: i32 = 8;
    pub const BITAND: i32 = 7;
    pub const BITXOR: i32 = 6;
    pub const BITOR: i32 = 5;
    pub const COMPARATIVE: i32 = 4;
    pub const AND: i32 = 3;
    pub const OR: i32 = 2;
    pub const RANGE: i32 = 1;
    pub const COMMENT: i32 = 0;
}

fn comma_sep(rule: Rule) -> Rule {
    optional(seq![rule.clone(), repeat(seq![",", rule])])
}

fn binary_expression() -> Rule {
    let table = [
        (level::AND, Rule::from("&&")),
        (level::OR, Rule::from("||")),
        (level::BITAND, Rule::from("&")),
        (level::BITOR, Rule::from("|")),
        (level::BITXOR, Rule::from("^")),
        (level::COMPARATIVE, choice!["==", "!=", "<", "<=", ">", ">="]),
        (level::SHIFT, choice!["<<", ">>"]),
        (level::ADDITIVE, choice!["+", "-"]),
        (level::MULTIPLICATIVE, choice!["*", "/", "%"]),
    ];
    crate::grammar::choice(table.into_iter().map(|(precedence, operator)| {
        prec_left(
            precedence,
            seq![
                field("left", sym("_expression")),
                field("operator", operator),
                field("right", sym("_expression")),
            ],
        )
    }))
}

/// Text between quotes, up to an escape or the closing quote.
fn string_content(excluded: &str) -> Rule {
    alias(
        token_immediate(prec(1, pattern(&format!(r"[^\\{excluded}\n]+")))),
        "string_content",
        true,
    )
}

pub fn grammar() -> Grammar {
    Grammar::builder("zeus")
        .rule("source_file", repeat(sym("_definition")))
        .rule(
            "use_statement",
            seq!["use", repeat(seq![sym("identifier"), optional("::")]), ";"],
        )
        .rule(
            "struct_definition",
            seq![
                "struct",
                field("name", seq![sym("identifier"), optional(sym("generic"))]),
                "{",
                repeat(sym("parameter")),
                repeat(choice![sym("function_definition"), sym("comment")]),
                "}",
            ],
        )
        .rule(
            "struct_initialization",
            prec_left(
                level::FIELD,
                seq![
                    sym("identifier"),
                    optional(sym("generic")),
                    "{",
                    repeat(sym("field_init")),
                    "}",
                ],
            ),
        )
        .rule(
            "field_init",
            seq![
                field("name", sym("identifier")),
                ":",
                sym("_expression"),
                optional(";"),
            ],
        )
        .rule(
            "_definition",
            choice![
                sym("function_definition"),
                sym("extern_function_definition"),
                sym("comment"),
                sym("use_statement"),
                sym("struct_definition"),
            ],
        )
        .rule("comment", choice![sym("line_comment"), sym("block_comment")])
        .rule(
            "line_comment",
            token(prec(level::COMMENT, seq!["//", pattern(r"[^\n]*")])),
        )
        // extras must be tokens
        .rule("block_comment", token(seq!["/*", pattern("[a-zA-Z ]+"), "*/"]))
        .rule(
            "extern_function_definition",
            seq![
                "extern",
                "fn",
                field("name", sym("identifier")),
                sym("parameter_list"),
                optional(seq![":", field("return_type", sym("type"))]),
                ";",
            ],
        )
        .rule(
            "function_definition",
            seq![
                "fn",
                field("name", sym("identifier")),
                optional(sym("generic")),
                sym("parameter_list"),
                optional(seq![":", field("return_type", sym("type"))]),
                field("func_block", sym("block")),
            ],
        )
        .rule(
            "parameter_list",
            seq!["(", optional(repeat(sym("parameter"))), ")"],
        )
        .rule(
            "parameter",
            seq![
                field("name", sym("identifier")),
                ":",
                field("mut", optional(sym("mut"))),
                field("type", sym("type")),
                optional(","),
            ],
        )
        .rule("mut", "mut")
        .rule(
            "primitive_type",
            choice!["bool", "i32", "i64", "u64", "u32", "u8", "double", "float", "void"],
        )
        .rule(
            "non_generic_type",
            choice![sym("primitive_type"), "string", sym("identifier"), sym("array_type")],
        )
        .rule(
            "type",
            choice![
                prec(3, sym("primitive_type")),
                prec(3, "string"),
                prec(3, sym("identifier")),
                prec(3, sym("array_type")),
                prec(2, sym("pointer_type")),
                prec(2, sym("ref_type")),
                prec(1, sym("generic_type")),
            ],
        )
        .rule("pointer_type", seq!["*", sym("type")])
        .rule("ref_type", seq!["&", sym("type")])
        .rule("generic", seq!["<", sym("non_generic_type"), ">"])
        .rule("generic_type", seq![sym("identifier"), sym("generic")])
        .rule(
            "array_type",
            seq!["[", sym("type"), ";", sym("number"), "]"],
        )
        .rule("block", seq!["{", repeat(sym("_statement")), "}"])
        .rule(
            "_statement",
            choice![
                sym("return_statement"),
                sym("variable_declaration"),
                sym("variable_assignment"),
                sym("field_assignment"),
                sym("array_assignment"),
                sym("comment"),
                sym("if_statement"),
                sym("while_statement"),
                sym("for_statement"),
                sym("break"),
                sym("continue"),
                seq![sym("call_expression"), ";"],
                seq![sym("match_expression"), ";"],
            ],
        )
        .rule(
            "if_statement",
            seq![
                "if",
                sym("_expression"),
                field("if_block", sym("block")),
                field("else_block", optional(seq!["else", sym("block")])),
            ],
        )
        .rule(
            "while_statement",
            seq!["while", sym("_expression"), sym("block")],
        )
        .rule(
            "variable_assignment",
            seq![
                field("name", sym("identifier")),
                field("value", seq!["=", sym("_expression")]),
                ";",
            ],
        )
        .rule(
            "field_assignment",
            seq![
                field("object", sym("identifier")),
                ".",
                field("name", choice![sym("identifier"), sym("array_access")]),
                field("value", seq!["=", sym("_expression")]),
                ";",
            ],
        )
        .rule(
            "match_expression",
            seq!["match", sym("_expression"), sym("match_block")],
        )
        .rule(
            "match_block",
            seq![
                "{",
                repeat(seq![sym("match_key"), "=>", sym("_expression"), ","]),
                "}",
            ],
        )
        .rule(
            "match_key",
            choice![
                sym("identifier"),
                sym("constant_list"),
                sym("number"),
                sym("char_literal"),
                sym("range"),
            ],
        )
        .rule(
            "constant_list",
            prec_left(
                level::ADDITIVE,
                seq![
                    sym("number"),
                    "|",
                    repeat(seq![sym("number"), optional("|")]),
                ],
            ),
        )
        .rule(
            "for_statement",
            seq![
                "for",
                optional("let"),
                sym("identifier"),
                "in",
                choice![sym("identifier"), sym("range")],
                sym("block"),
            ],
        )
        .rule(
            "range",
            prec_left(
                level::RANGE,
                seq![sym("_expression"), "..", optional("="), sym("_expression")],
            ),
        )
        .rule("break", seq!["break", ";"])
        .rule("continue", seq!["continue", ";"])
        .rule(
            "array_assignment",
            seq![
                field("name", sym("primary_expression")),
                "[",
                sym("primary_expression"),
                "]",
                field("value", seq!["=", sym("_expression")]),
                ";",
            ],
        )
        .rule(
            "array_access",
            prec_left(
                level::FIELD,
                seq![sym("identifier"), "[", sym("primary_expression"), "]"],
            ),
        )
        .rule(
            "variable_declaration",
            seq![
                "let",
                optional("mut"),
                field("name", sym("identifier")),
                field("type", seq![":", sym("type")]),
                optional(field("value", seq!["=", sym("_initializer_expression")])),
                ";",
            ],
        )
        .rule(
            "return_statement",
            seq!["return", sym("_expression"), ";"],
        )
        .rule(
            "field_access",
            prec_left(
                level::FIELD,
                seq![sym("identifier"), ".", sym("primary_expression")],
            ),
        )
        .rule("typecast", seq![sym("_expression"), "as", sym("type")])
        .rule(
            "primary_expression",
            choice![
                sym("number"),
                sym("char_literal"),
                sym("string_literal"),
                sym("null"),
                sym("true"),
                sym("false"),
                sym("call_expression"),
                sym("field_access"),
                sym("identifier"),
                sym("match_expression"),
                sym("typecast"),
                sym("array_access"),
            ],
        )
        .rule(
            "_initializer_expression",
            choice![sym("struct_initialization"), sym("_expression")],
        )
        .rule(
            "_expression",
            choice![sym("binary_expression"), sym("primary_expression")],
        )
        .rule("null", "null")
        .rule("true", "true")
        .rule("false", "false")
        .rule(
            "string_literal",
            seq![
                "\"",
                repeat(choice![string_content("\""), sym("escape_sequence")]),
                "\"",
            ],
        )
        .rule(
            "escape_sequence",
            token(prec(
                1,
                seq![
                    "\\",
                    choice![
                        pattern("[^xuU]"),
                        pattern(r"\d{2,3}"),
                        pattern("x[0-9a-fA-F]{2,}"),
                        pattern(r"u\{[0-9a-fA-F]{1,6}\}"),
                    ],
                ],
            )),
        )
        .rule(
            "char_literal",
            seq![
                "'",
                choice![string_content("'"), sym("escape_sequence")],
                "'",
            ],
        )
        .rule(
            "call_expression",
            seq![
                field("function", sym("identifier")),
                prec_dynamic(10, optional(sym("generic"))),
                sym("arglist"),
            ],
        )
        .rule("arglist", seq!["(", comma_sep(sym("_expression")), ")"])
        .rule("binary_expression", binary_expression())
        .rule("identifier", pattern(r"[_\p{XID_Start}][_\p{XID_Continue}]*"))
        .rule("number", pattern(r"\d+"))
        .extras([pattern(r"\s"), sym("line_comment"), sym("block_comment")])
        .word("identifier")
        .conflict(["primary_expression", "call_expression"])
        .build()
}
