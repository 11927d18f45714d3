use super::*;
use pretty_assertions::assert_eq;

fn loc() -> SourceLocation {
    SourceLocation::new("test.c", 1, 1)
}

#[test]
fn test_offsets_are_monotonic_and_word_aligned() {
    let mut table = SymbolTable::new();
    let sizes = [1u32, 5, 1, 3, 1];
    let mut expected = 0u32;
    for (i, &size) in sizes.iter().enumerate() {
        let name = format!("v{}", i);
        let offset = if size == 1 {
            table.declare(&name, ValueType::Int, loc()).unwrap()
        } else {
            table.declare_array(&name, ValueType::Int, size, loc()).unwrap()
        };
        assert_eq!(offset, expected);
        assert_eq!(offset % WORD_SIZE, 0);
        expected += WORD_SIZE * size;
    }
    assert_eq!(table.frame_size(), 4 * 11);
}

#[test]
fn test_duplicate_declaration_is_rejected() {
    let mut table = SymbolTable::new();
    table.declare("x", ValueType::Int, loc()).unwrap();
    let err = table
        .declare("x", ValueType::Float, SourceLocation::new("test.c", 2, 3))
        .unwrap_err();
    assert_eq!(
        err,
        CompilerError::declaration("x", SourceLocation::new("test.c", 2, 3))
    );
    // Failed declaration does not consume frame space
    assert_eq!(table.frame_size(), 4);
}

#[test]
fn test_lookup_queries() {
    let mut table = SymbolTable::new();
    table.declare("x", ValueType::Int, loc()).unwrap();
    table.declare("y", ValueType::Float, loc()).unwrap();
    table.declare_array("a", ValueType::Int, 5, loc()).unwrap();

    assert_eq!(table.lookup_offset("y", &loc()).unwrap(), 4);
    assert_eq!(table.lookup_offset("a", &loc()).unwrap(), 8);
    assert_eq!(table.lookup_type("y"), Some(ValueType::Float));
    assert_eq!(table.lookup_type("nope"), None);
    assert!(table.is_array("a"));
    assert!(!table.is_array("x"));
    assert!(matches!(
        table.lookup_offset("nope", &loc()),
        Err(CompilerError::Reference { .. })
    ));
}

#[test]
fn test_colliding_names_chain_in_one_bucket() {
    // Many names over 211 buckets guarantee collisions; all stay reachable
    let mut table = SymbolTable::new();
    for i in 0..400 {
        table.declare(&format!("var{}", i), ValueType::Int, loc()).unwrap();
    }
    assert!(table.collisions() > 0);
    for i in 0..400 {
        assert_eq!(table.lookup_offset(&format!("var{}", i), &loc()).unwrap(), i * 4);
    }
}

#[test]
fn test_array_param_is_one_word() {
    let mut table = SymbolTable::new();
    table.declare_param("arr", ValueType::Int, true, loc()).unwrap();
    table.declare_param("n", ValueType::Int, false, loc()).unwrap();
    let arr = table.lookup("arr").unwrap();
    assert!(arr.is_array && arr.by_reference);
    assert_eq!(arr.size_bytes(), 4);
    assert_eq!(table.lookup_offset("n", &loc()).unwrap(), 4);
}

#[test]
fn test_zero_length_array_rejected() {
    let mut table = SymbolTable::new();
    assert!(matches!(
        table.declare_array("a", ValueType::Int, 0, loc()),
        Err(CompilerError::Type { .. })
    ));
}

#[test]
fn test_symbols_iterate_in_declaration_order() {
    let mut table = SymbolTable::new();
    for name in ["zeta", "alpha", "mid"] {
        table.declare(name, ValueType::Int, loc()).unwrap();
    }
    let names: Vec<&str> = table.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["zeta", "alpha", "mid"]);
}

#[test]
fn test_function_table() {
    let mut functions = FunctionTable::new();
    let params = vec![ParamInfo {
        name: "n".to_string(),
        ty: ValueType::Int,
        is_array: false,
    }];
    let f = functions
        .declare_function("square", ValueType::Int, params, 0, loc())
        .unwrap();
    f.symtab.declare_param("n", ValueType::Int, false, loc()).unwrap();

    assert_eq!(functions.get("square").unwrap().param_count(), 1);
    assert_eq!(functions.get("square").unwrap().symtab.frame_size(), 4);
    assert!(functions.get("main").is_none());

    let dup = functions.declare_function("square", ValueType::Void, Vec::new(), 1, loc());
    assert!(matches!(dup, Err(CompilerError::Declaration { .. })));
}

#[test]
fn test_dump_lists_every_symbol() {
    let mut table = SymbolTable::new();
    table.declare("x", ValueType::Int, loc()).unwrap();
    table.declare_array("buf", ValueType::Float, 3, loc()).unwrap();
    assert!(table.lookup("x").is_some());
    assert!(table.lookup("missing").is_none());
    assert_eq!(table.lookup_offset("buf", &loc()).unwrap(), 4);
    assert_eq!(table.lookups(), 3);
    let dump = table.dump();
    assert!(dump.contains("x"));
    assert!(dump.contains("buf"));
    assert!(dump.contains("frame 16 bytes, 2 symbols"));
    assert!(dump.contains("3 lookups"));
    assert!(dump.contains("load factor 0.009"));
}

#[test]
fn test_declarations_do_not_count_as_lookups() {
    let mut table = SymbolTable::new();
    table.declare("a", ValueType::Int, loc()).unwrap();
    table.declare("b", ValueType::Int, loc()).unwrap();
    assert_eq!(table.lookups(), 0);
}

#[test]
fn test_oversized_array_is_rejected() {
    let mut table = SymbolTable::new();
    let err = table.declare_array("a", ValueType::Int, 1 << 30, loc()).unwrap_err();
    assert!(matches!(err, CompilerError::Unsupported { .. }));
    assert!(table.is_empty());
    assert_eq!(table.frame_size(), 0);
}

#[test]
fn test_frame_limit_counts_earlier_symbols() {
    let mut table = SymbolTable::new();
    let half = MAX_FRAME_BYTES / WORD_SIZE / 2;
    table.declare_array("a", ValueType::Int, half, loc()).unwrap();
    table.declare_array("b", ValueType::Int, half, loc()).unwrap();
    assert_eq!(table.frame_size(), MAX_FRAME_BYTES);
    let err = table.declare("x", ValueType::Int, loc()).unwrap_err();
    assert!(matches!(err, CompilerError::Unsupported { .. }));
}
