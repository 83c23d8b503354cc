//! Interactive REPL for golf scripts
//!
//! Every entry runs against one persistent script, so declarations made at
//! the prompt stay visible to later entries.

use crate::settings::Settings;
use anyhow::Result;
use golf_script::{Script, ScriptOptions, Scoping, Val};
use rustyline::error::ReadlineError;
use rustyline::history::DefaultHistory;
use rustyline::{CompletionType, Config, EditMode, Editor};
use std::path::{Path, PathBuf};

pub struct Repl {
    script: Script,
    editor: Editor<(), DefaultHistory>,
    history_path: Option<PathBuf>,
}

enum CommandResult {
    Continue,
    Exit,
    Error(String),
}

impl Repl {
    pub fn new(scoping: Scoping, settings: &Settings) -> Result<Self> {
        let config = Config::builder()
            .history_ignore_space(true)
            .max_history_size(settings.history_size)?
            .completion_type(CompletionType::List)
            .edit_mode(EditMode::Emacs)
            .build();

        let mut editor = Editor::with_config(config)?;

        let history_path = history_path();
        if let Some(ref path) = history_path {
            let _ = editor.load_history(path);
        }

        let options = ScriptOptions::default().with_scoping(scoping);
        let script = Script::load_with_options("<repl>", "", options)?;

        Ok(Self {
            script,
            editor,
            history_path,
        })
    }

    pub fn run(&mut self) -> Result<()> {
        println!("{}", WELCOME_MESSAGE);

        let mut buffer = String::new();

        loop {
            let prompt = if buffer.is_empty() { "gs> " } else { "...> " };

            match self.editor.readline(prompt) {
                Ok(line) => {
                    let trimmed = line.trim();

                    if buffer.is_empty() && trimmed.starts_with(':') {
                        match self.handle_command(trimmed) {
                            CommandResult::Continue => {}
                            CommandResult::Exit => break,
                            CommandResult::Error(e) => eprintln!("Error: {}", e),
                        }
                        continue;
                    }

                    buffer.push_str(&line);
                    buffer.push('\n');

                    // Keep reading while a block or call is still open
                    if !is_balanced(&buffer) {
                        continue;
                    }

                    let input = std::mem::take(&mut buffer);
                    if input.trim().is_empty() {
                        continue;
                    }
                    let _ = self.editor.add_history_entry(input.trim_end());
                    self.eval_and_print(&input);
                }
                Err(ReadlineError::Interrupted) => {
                    if buffer.is_empty() {
                        println!("Use :quit or Ctrl+D to exit");
                    } else {
                        println!("^C - input cancelled");
                        buffer.clear();
                    }
                }
                Err(ReadlineError::Eof) => {
                    println!("\nGoodbye!");
                    break;
                }
                Err(err) => {
                    eprintln!("Error: {:?}", err);
                    break;
                }
            }
        }

        if let Some(ref path) = self.history_path {
            if let Some(parent) = path.parent() {
                let _ = std::fs::create_dir_all(parent);
            }
            let _ = self.editor.save_history(path);
        }

        Ok(())
    }

    fn eval_and_print(&mut self, input: &str) {
        match self.script.eval_source(&with_semicolon(input)) {
            Ok(Some(Val::Void) | None) => {}
            Ok(Some(val)) => println!("=> {}", self.script.display(&val)),
            Err(e) => eprintln!("Error: {}:{}: {}", e.line, e.col, e.message),
        }
    }

    fn handle_command(&mut self, cmd: &str) -> CommandResult {
        let (command, arg) = match cmd.split_once(' ') {
            Some((c, a)) => (c, Some(a.trim())),
            None => (cmd, None),
        };

        match command {
            ":help" | ":h" | ":?" => {
                println!("{}", HELP_MESSAGE);
                CommandResult::Continue
            }
            ":quit" | ":q" | ":exit" => CommandResult::Exit,
            ":globals" | ":g" => {
                self.print_globals();
                CommandResult::Continue
            }
            ":load" | ":l" => match arg {
                Some(path) => self.load_file(Path::new(path)),
                None => {
                    println!("Usage: :load <filename>");
                    CommandResult::Continue
                }
            },
            _ => CommandResult::Error(format!(
                "Unknown command: {}. Type :help for available commands.",
                command
            )),
        }
    }

    fn print_globals(&self) {
        let user: Vec<_> = self
            .script
            .globals()
            .into_iter()
            .filter(|(name, val)| !matches!(val, Val::NativeFn(_)) && !is_builtin_constant(name))
            .collect();
        if user.is_empty() {
            println!("No globals defined");
            return;
        }
        for (name, val) in user {
            match self.script.fn_signature(&name) {
                Some(sig) => {
                    let params: Vec<_> = sig
                        .params
                        .iter()
                        .map(|(n, ty)| format!("{} {}", ty, n))
                        .collect();
                    println!("  {} {}({})", sig.return_type, name, params.join(", "));
                }
                None => println!("  {} {} = {}", val.ty(), name, self.script.display(&val)),
            }
        }
    }

    fn load_file(&mut self, path: &Path) -> CommandResult {
        match std::fs::read_to_string(path) {
            Ok(source) => {
                println!("Loading {}...", path.display());
                self.eval_and_print(&source);
                CommandResult::Continue
            }
            Err(e) => CommandResult::Error(format!("Failed to read {}: {}", path.display(), e)),
        }
    }
}

fn is_builtin_constant(name: &str) -> bool {
    matches!(name, "PI" | "true" | "false")
}

/// Allow a bare expression at the prompt without its trailing `;`
fn with_semicolon(input: &str) -> String {
    let trimmed = input.trim_end();
    if trimmed.ends_with(';') || trimmed.ends_with('}') {
        trimmed.to_string()
    } else {
        format!("{};", trimmed)
    }
}

/// Check if braces/brackets/parens are balanced outside string literals
fn is_balanced(input: &str) -> bool {
    let mut depth = 0i32;
    let mut in_string = false;

    for line in input.lines() {
        let mut chars = line.chars().peekable();
        while let Some(c) = chars.next() {
            if c == '"' {
                in_string = !in_string;
            } else if !in_string {
                match c {
                    '/' if chars.peek() == Some(&'/') => break,
                    '(' | '{' | '[' => depth += 1,
                    ')' | '}' | ']' => depth -= 1,
                    _ => {}
                }
            }
        }
    }

    depth <= 0
}

fn history_path() -> Option<PathBuf> {
    dirs::data_local_dir().map(|d| d.join("golf-script").join("repl_history"))
}

const WELCOME_MESSAGE: &str = r#"
golf-script REPL
Enter declarations, statements or expressions. Type :help for commands.
"#;

const HELP_MESSAGE: &str = r#"
Commands:
  :help, :h, :?     - Show this help message
  :quit, :q, :exit  - Exit the REPL
  :globals, :g      - Show globals declared in this session
  :load <file>      - Run a script file in this session

Tips:
  - Unfinished input (an open brace or parenthesis) continues on the next line
  - A trailing ';' is optional for a single expression
  - Declarations persist between entries
  - Use Ctrl+C to cancel current input, Ctrl+D to exit
"#;

pub fn run_repl(load: Option<&Path>, scoping: Scoping, settings: &Settings) -> Result<()> {
    let mut repl = Repl::new(scoping, settings)?;
    if let Some(path) = load {
        if let CommandResult::Error(e) = repl.load_file(path) {
            eprintln!("Error: {}", e);
        }
    }
    repl.run()
}
