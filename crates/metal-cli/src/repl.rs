//! Interactive session: one chunk per complete input.

use std::io::{self, BufRead, Write};

use metal_eval::{Flow, Replay, Vm};
use metal_parser::is_incomplete;
use metal_types::SourceFile;

use crate::report::Reporter;

const PROMPT: &str = "metaL> ";
const CONTINUE_PROMPT: &str = "  ...> ";
const STDIN: &str = "<stdin>";

/// Read chunks from `input` and run each one until end of input or until
/// `??` / `.end` ends the session.
///
/// A chunk is one line, extended with further lines while a string literal
/// or a `(` / `[` is still open. Dumps go to `output`; diagnostics go
/// through `reporter`.
pub fn start<R: BufRead, W: Write>(
    vm: &mut Vm,
    mut input: R,
    output: &mut W,
    reporter: &Reporter,
) -> io::Result<()> {
    loop {
        write!(output, "{PROMPT}")?;
        output.flush()?;

        let Some(chunk) = read_chunk(&mut input, output)? else {
            writeln!(output)?;
            return Ok(());
        };

        let outcome = vm.execute(&chunk, Replay::Interactive);
        for dump in vm.drain_output() {
            writeln!(output, "{dump}")?;
        }
        for err in &outcome.errors {
            reporter.error(err);
        }
        if outcome.flow == Flow::Exit {
            return Ok(());
        }
    }
}

/// Gather lines until they no longer end inside an open literal or group.
/// `None` once input is exhausted with nothing buffered.
fn read_chunk<R: BufRead, W: Write>(input: &mut R, output: &mut W) -> io::Result<Option<SourceFile>> {
    let mut text = String::new();
    loop {
        if input.read_line(&mut text)? == 0 {
            // an unfinished chunk still runs, so its error gets reported
            return Ok((!text.is_empty()).then(|| SourceFile::new(STDIN, text)));
        }
        let chunk = SourceFile::new(STDIN, text.as_str());
        if !is_incomplete(&chunk) {
            return Ok(Some(chunk));
        }
        write!(output, "{CONTINUE_PROMPT}")?;
        output.flush()?;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(script: &str) -> (Vm, String) {
        let mut vm = Vm::new();
        let mut out = Vec::new();
        start(&mut vm, script.as_bytes(), &mut out, &Reporter::new(false)).unwrap();
        (vm, String::from_utf8(out).unwrap())
    }

    fn dump_of(vm: &Vm, name: &str) -> String {
        vm.dump(vm.get(name).unwrap())
    }

    #[test]
    fn test_lines_share_one_vm() {
        let (vm, _) = session("x = 1\ny = x\n");
        assert_eq!(vm.get("x"), vm.get("y"));
    }

    #[test]
    fn test_question_mark_writes_dump() {
        let (_, out) = session("?\n");
        assert!(out.starts_with("metaL> \n<vm:metaL>\n\tvm = <vm:metaL> _/"));
    }

    #[test]
    fn test_end_stops_reading() {
        let (vm, out) = session(".end\nx = 1\n");
        assert!(vm.get("x").is_err());
        assert_eq!(out, PROMPT);
    }

    #[test]
    fn test_error_does_not_end_session() {
        let (vm, _) = session("nope\nx = 1\n");
        assert!(vm.get("x").is_ok());
    }

    #[test]
    fn test_vector_across_lines() {
        let (vm, out) = session("v = [\n1\n2\n]\n");
        assert_eq!(
            dump_of(&vm, "v"),
            "\n<vector:>\n\t0 = <integer:1>\n\t1 = <integer:2>"
        );
        // only the assignment result, no stray elements
        assert_eq!(vm.stack().len(), 1);
        assert_eq!(out.matches(CONTINUE_PROMPT).count(), 3);
    }

    #[test]
    fn test_string_across_lines() {
        let (vm, _) = session("s = 'a\nb'\n");
        assert_eq!(dump_of(&vm, "s"), "\n<string:a\\nb>");
        assert_eq!(vm.stack().len(), 1);
    }

    #[test]
    fn test_parens_across_lines() {
        let (vm, _) = session("x = (\n5\n)\ny = x\n");
        assert_eq!(dump_of(&vm, "y"), "\n<integer:5>");
    }

    #[test]
    fn test_unfinished_chunk_at_end_of_input() {
        let (vm, out) = session("v = [\n1\n");
        assert!(vm.get("v").is_err());
        assert!(vm.stack().is_empty());
        assert!(out.ends_with(&format!("{CONTINUE_PROMPT}{PROMPT}\n")));
    }
}
