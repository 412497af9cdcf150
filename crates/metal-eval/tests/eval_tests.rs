//! Evaluator and REPL driver tests.
//!
//! Covers: assignment, symbol lookup, quote, the push/store/apply
//! operators, class construction, stack commands, control statements,
//! error policies of both replay modes, bootstrap, and determinism.

use metal_eval::{Flow, Outcome, Replay, Vm};
use metal_types::{ErrorCategory, ErrorCode};

const BOOTSTRAP: &str = include_str!("../../../metaL.ini");

// ─────────────────────────────────────────────────────────────────────
// Helpers
// ─────────────────────────────────────────────────────────────────────

/// Run `source` on a fresh VM in batch mode, panicking on any error.
fn vm_with(source: &str) -> Vm {
    let mut vm = Vm::new();
    let outcome = vm.run("test.ini", source, Replay::Batch);
    if !outcome.is_ok() {
        for e in &outcome.errors {
            eprintln!("  ERROR: {e}");
        }
        panic!("unexpected errors (see above)");
    }
    vm
}

/// Run `source` on a fresh VM and return the VM with the outcome.
fn run(source: &str, replay: Replay) -> (Vm, Outcome) {
    let mut vm = Vm::new();
    let outcome = vm.run("test.ini", source, replay);
    (vm, outcome)
}

/// Test dump of the root binding `name`.
fn lookup(vm: &Vm, name: &str) -> String {
    let node = vm
        .get(name)
        .unwrap_or_else(|e| panic!("'{name}' not bound: {e}"));
    vm.dump(node)
}

/// Headers of the VM stack, bottom first.
fn stack(vm: &Vm) -> Vec<String> {
    vm.stack().iter().map(|&n| vm.head(n)).collect()
}

// ─────────────────────────────────────────────────────────────────────
// Assignment & lookup
// ─────────────────────────────────────────────────────────────────────

#[test]
fn test_assignment_binds_and_returns_value() {
    let vm = vm_with("x = 5");
    assert_eq!(lookup(&vm, "x"), "\n<integer:5>");
    assert_eq!(stack(&vm), ["<integer:5>"]);
}

#[test]
fn test_symbol_resolves_to_bound_node() {
    let vm = vm_with("x = 5\nx");
    assert_eq!(vm.stack().len(), 2);
    assert_eq!(vm.stack()[0], vm.stack()[1]);
    assert_eq!(vm.get("x"), Ok(vm.stack()[1]));
}

#[test]
fn test_unbound_symbol() {
    let (_, outcome) = run("y", Replay::Batch);
    assert_eq!(outcome.errors.len(), 1);
    let err = &outcome.errors[0];
    assert_eq!(err.code, ErrorCode::UNBOUND_SYMBOL);
    assert_eq!(err.category, ErrorCategory::Runtime);
    assert_eq!(err.message, "unbound symbol 'y'");
}

#[test]
fn test_assignment_is_right_associative() {
    let vm = vm_with("a = b = 1");
    assert_eq!(vm.get("a"), vm.get("b"));
    assert_eq!(lookup(&vm, "a"), "\n<integer:1>");
}

#[test]
fn test_rebinding_overwrites() {
    let vm = vm_with("x = 1\nx = 'two'");
    assert_eq!(lookup(&vm, "x"), "\n<string:two>");
}

#[test]
fn test_assignment_to_computed_name() {
    let vm = vm_with("'answer' = 42");
    assert_eq!(lookup(&vm, "answer"), "\n<integer:42>");
}

#[test]
fn test_assignment_copies_nothing() {
    let vm = vm_with("a = 1\nb = a");
    assert_eq!(vm.get("a"), vm.get("b"));
}

#[test]
fn test_literal_display_values() {
    let vm = vm_with("h = 0x1F\nb = 0b101\nn = -7\nf = 2.0");
    assert_eq!(lookup(&vm, "h"), "\n<hex:0x1f>");
    assert_eq!(lookup(&vm, "b"), "\n<bin:0b101>");
    assert_eq!(lookup(&vm, "n"), "\n<integer:-7>");
    assert_eq!(lookup(&vm, "f"), "\n<number:2.0>");
}

// ─────────────────────────────────────────────────────────────────────
// Quote
// ─────────────────────────────────────────────────────────────────────

#[test]
fn test_quote_suppresses_lookup() {
    let vm = vm_with("`x");
    assert_eq!(stack(&vm), ["<symbol:x>"]);
}

#[test]
fn test_quoted_assignment_target() {
    let vm = vm_with("`x = 5");
    assert_eq!(lookup(&vm, "x"), "\n<integer:5>");
}

#[test]
fn test_quote_keeps_operator_tree() {
    let vm = vm_with("code = `(a // b)");
    assert_eq!(
        lookup(&vm, "code"),
        "\n<op://>\n\t0 = <symbol:a>\n\t1 = <symbol:b>"
    );
}

// ─────────────────────────────────────────────────────────────────────
// Push / store / apply
// ─────────────────────────────────────────────────────────────────────

#[test]
fn test_push_appends_and_returns_left() {
    let vm = vm_with("s = stack : 'st'\ns // 1 // 2");
    assert_eq!(
        lookup(&vm, "s"),
        "\n<stack:st>\n\t0 = <integer:1>\n\t1 = <integer:2>"
    );
    assert_eq!(vm.stack()[1], vm.get("s").unwrap());
}

#[test]
fn test_tag_store() {
    let vm = vm_with("o = dict : 'cfg'\no << 127.0.0.1");
    assert_eq!(lookup(&vm, "o"), "\n<dict:cfg>\n\tip = <ip:127.0.0.1>");
}

#[test]
fn test_named_store() {
    let vm = vm_with("o = dict : 'cfg'\no >> port : 80");
    assert_eq!(lookup(&vm, "o"), "\n<dict:cfg>\n\t80 = <port:80>");
}

#[test]
fn test_store_into_vm() {
    let vm = vm_with("vm << 0x1F");
    assert_eq!(lookup(&vm, "hex"), "\n<hex:0x1f>");
    assert_eq!(stack(&vm), ["<vm:metaL>"]);
}

#[test]
fn test_class_construction() {
    let vm = vm_with(
        "p = port : 12345\nu = url : 'http://x.org'\nf = file : 'logo.png'\ne = email : 'me@x.org'",
    );
    assert_eq!(lookup(&vm, "p"), "\n<port:12345>");
    assert_eq!(lookup(&vm, "u"), "\n<url:http://x.org>");
    assert_eq!(lookup(&vm, "f"), "\n<file:logo.png>");
    assert_eq!(lookup(&vm, "e"), "\n<email:me@x.org>");
}

#[test]
fn test_class_builds_fresh_node() {
    let vm = vm_with("n = 80\np = port : n");
    assert_ne!(vm.get("n"), vm.get("p"));
    assert_eq!(lookup(&vm, "n"), "\n<integer:80>");
}

#[test]
fn test_apply_on_plain_value_fails() {
    let (_, outcome) = run("5 : 6", Replay::Batch);
    assert_eq!(outcome.errors[0].code, ErrorCode::NOT_APPLICABLE);
    assert_eq!(outcome.errors[0].message, "<integer:5> cannot be applied");
}

#[test]
fn test_vector_literal_is_unevaluated_value() {
    let vm = vm_with("v = list[ a b ]");
    assert_eq!(
        lookup(&vm, "v"),
        "\n<vector:list>\n\t0 = <symbol:a>\n\t1 = <symbol:b>"
    );
}

// ─────────────────────────────────────────────────────────────────────
// Stack commands
// ─────────────────────────────────────────────────────────────────────

#[test]
fn test_bare_commands_work_on_vm_stack() {
    assert_eq!(stack(&vm_with("1 2 dup")), ["<integer:1>", "<integer:2>", "<integer:2>"]);
    assert_eq!(stack(&vm_with("1 2 drop")), ["<integer:1>"]);
    assert_eq!(stack(&vm_with("1 2 swap")), ["<integer:2>", "<integer:1>"]);
    assert_eq!(stack(&vm_with("1 2 over")), ["<integer:1>", "<integer:2>", "<integer:1>"]);
    assert_eq!(stack(&vm_with("1 2 3 press")), ["<integer:1>", "<integer:3>"]);
    assert!(stack(&vm_with("1 2 dropall")).is_empty());
}

#[test]
fn test_applied_command_works_on_operand() {
    let vm = vm_with("s = stack : 'st'\ns // 1 // 2\n;\nswap : s");
    assert_eq!(
        lookup(&vm, "s"),
        "\n<stack:st>\n\t0 = <integer:2>\n\t1 = <integer:1>"
    );
    assert_eq!(stack(&vm), ["<stack:st>"]);
}

#[test]
fn test_command_on_empty_stack() {
    let (_, outcome) = run("dup", Replay::Batch);
    assert_eq!(outcome.errors[0].code, ErrorCode::EMPTY_STACK);
}

// ─────────────────────────────────────────────────────────────────────
// Control statements
// ─────────────────────────────────────────────────────────────────────

#[test]
fn test_semicolon_clears_stack() {
    let vm = vm_with("1 2 ;");
    assert!(vm.stack().is_empty());
}

#[test]
fn test_question_mark_prints_vm() {
    let mut vm = vm_with("x = 1\n?");
    let output = vm.drain_output();
    assert_eq!(output.len(), 1);
    assert!(output[0].starts_with("\n<vm:metaL>\n\tvm = <vm:metaL> _/\n\tdup = <command:dup>"));
    assert!(output[0].contains("\n\tx = <integer:1>"));
    assert!(output[0].ends_with("\n\t0 = <integer:1> _/"));
}

#[test]
fn test_double_question_prints_and_exits() {
    let (mut vm, outcome) = run("??\ny = 1", Replay::Batch);
    assert_eq!(outcome.flow, Flow::Exit);
    assert_eq!(vm.drain_output().len(), 1);
    assert!(vm.get("y").is_err());
}

#[test]
fn test_end_marker_exits_silently() {
    let (mut vm, outcome) = run("x = 1\n.end\ny = 2", Replay::Batch);
    assert_eq!(outcome.flow, Flow::Exit);
    assert!(outcome.is_ok());
    assert!(vm.drain_output().is_empty());
    assert!(vm.get("x").is_ok());
    assert!(vm.get("y").is_err());
}

// ─────────────────────────────────────────────────────────────────────
// Error policies
// ─────────────────────────────────────────────────────────────────────

#[test]
fn test_interactive_runtime_error_skips_statement() {
    let (vm, outcome) = run("x = 1\nmissing\ny = 2", Replay::Interactive);
    assert_eq!(outcome.errors.len(), 1);
    assert_eq!(outcome.flow, Flow::Continue);
    assert!(vm.get("x").is_ok());
    assert!(vm.get("y").is_ok());
}

#[test]
fn test_batch_runtime_error_stops_run() {
    let (vm, outcome) = run("x = 1\nmissing\ny = 2", Replay::Batch);
    assert_eq!(outcome.errors.len(), 1);
    assert!(vm.get("x").is_ok());
    assert!(vm.get("y").is_err());
}

#[test]
fn test_interactive_collects_every_runtime_error() {
    let (_, outcome) = run("a\nb\nc = 1", Replay::Interactive);
    let codes: Vec<_> = outcome.errors.iter().map(|e| e.code).collect();
    assert_eq!(codes, [ErrorCode::UNBOUND_SYMBOL, ErrorCode::UNBOUND_SYMBOL]);
}

#[test]
fn test_syntax_error_drops_rest_of_chunk() {
    for replay in [Replay::Interactive, Replay::Batch] {
        let (vm, outcome) = run("x = 1\n)\ny = 2", replay);
        assert_eq!(outcome.errors.len(), 1);
        assert_eq!(outcome.errors[0].code, ErrorCode::UNEXPECTED_TOKEN);
        assert!(vm.get("x").is_ok());
        assert!(vm.get("y").is_err());
    }
}

#[test]
fn test_lex_error_after_executed_statements() {
    let (vm, outcome) = run("x = 1\ny = 'open", Replay::Interactive);
    assert_eq!(outcome.errors[0].code, ErrorCode::UNTERMINATED_STRING);
    assert_eq!(outcome.errors[0].category, ErrorCategory::Lexical);
    assert!(vm.get("x").is_ok());
}

#[test]
fn test_session_survives_failed_chunk() {
    let mut vm = Vm::new();
    let first = vm.run("<stdin>", "x = (", Replay::Interactive);
    assert!(!first.is_ok());
    let second = vm.run("<stdin>", "x = 1", Replay::Interactive);
    assert!(second.is_ok());
    assert_eq!(lookup(&vm, "x"), "\n<integer:1>");
}

#[test]
fn test_runtime_error_location() {
    let (_, outcome) = run("x = 1\n  x // nope", Replay::Batch);
    let err = &outcome.errors[0];
    assert_eq!(err.file, "test.ini");
    assert_eq!((err.span.start_line, err.span.start_col), (2, 3));
    assert_eq!(err.source_line, "  x // nope");
    assert_eq!(err.to_string(), "test.ini:2:3: E301 [runtime] unbound symbol 'nope'");
}

#[test]
fn test_error_json_shape() {
    let (_, outcome) = run("\nghost", Replay::Batch);
    let json = serde_json::to_value(&outcome.errors[0]).unwrap();
    assert_eq!(json["code"], 301);
    assert_eq!(json["category"], "runtime");
    assert_eq!(json["line"], 2);
    assert_eq!(json["message"], "unbound symbol 'ghost'");
}

// ─────────────────────────────────────────────────────────────────────
// Scenarios
// ─────────────────────────────────────────────────────────────────────

#[test]
fn test_end_to_end_ip_and_port() {
    let vm = vm_with("ip = '127.0.0.1'\nport = 12345");
    let ip = vm.get("ip").unwrap();
    let port = vm.get("port").unwrap();
    assert_eq!(vm.graph().node(ip).display_value(), "127.0.0.1");
    assert_eq!(vm.graph().node(port).display_value(), "12345");
}

#[test]
fn test_bootstrap() {
    let mut vm = Vm::new();
    let outcome = vm.run("metaL.ini", BOOTSTRAP, Replay::Batch);
    assert!(outcome.is_ok(), "{:?}", outcome.errors);
    assert_eq!(outcome.flow, Flow::Continue);
    assert_eq!(vm.head(vm.root()), "<vm:metaL>");
    assert_eq!(lookup(&vm, "IP"), "\n<ip:127.0.0.1>");
    assert_eq!(lookup(&vm, "PORT"), "\n<port:12345>");
    assert_eq!(lookup(&vm, "LOGO"), "\n<file:logo.png>");
    assert!(!vm.stack().is_empty());
}

#[test]
fn test_bootstrap_then_replay() {
    let mut vm = Vm::new();
    vm.run("metaL.ini", BOOTSTRAP, Replay::Batch);
    let outcome = vm.run("extra.ini", "web = dict : 'WEB'\nweb << IP << PORT", Replay::Batch);
    assert!(outcome.is_ok());
    assert_eq!(
        lookup(&vm, "web"),
        "\n<dict:WEB>\n\tip = <ip:127.0.0.1>\n\tport = <port:12345>"
    );
    assert_eq!(vm.resolve("web/port"), vm.get("PORT"));
}

#[test]
fn test_bootstrap_determinism_100_iterations() {
    let render = || {
        let mut vm = Vm::new();
        vm.run("metaL.ini", BOOTSTRAP, Replay::Batch);
        vm.render(vm.root())
    };
    let first = render();
    for i in 0..100 {
        assert_eq!(first, render(), "Determinism failure at iteration {i}");
    }
}
