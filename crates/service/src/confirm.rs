/// Answer to a confirmation prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confirmation {
    Yes,
    No,
    YesToAll,
    NoToAll,
}

/// Asks the user before destructive steps.
pub trait Confirm: Send {
    fn confirm(&mut self, query: &str, caption: &str) -> Confirmation;
}

/// Says yes to everything. Backs `--force`.
#[derive(Debug, Default, Clone, Copy)]
pub struct AlwaysConfirm;

impl Confirm for AlwaysConfirm {
    fn confirm(&mut self, _query: &str, _caption: &str) -> Confirmation {
        Confirmation::YesToAll
    }
}

/// One removal's worth of prompting. Remembers "to all" answers so the
///  prompter is not asked again.
pub struct ConfirmSession<'a> {
    prompter: &'a mut dyn Confirm,
    force: bool,
    yes_to_all: bool,
    no_to_all: bool,
}

impl<'a> ConfirmSession<'a> {
    pub fn new(prompter: &'a mut dyn Confirm, force: bool) -> Self {
        Self {
            prompter,
            force,
            yes_to_all: false,
            no_to_all: false,
        }
    }

    pub fn should_continue(&mut self, query: &str, caption: &str) -> bool {
        if self.force || self.yes_to_all {
            return true;
        }
        if self.no_to_all {
            return false;
        }
        match self.prompter.confirm(query, caption) {
            Confirmation::Yes => true,
            Confirmation::No => false,
            Confirmation::YesToAll => {
                self.yes_to_all = true;
                true
            }
            Confirmation::NoToAll => {
                self.no_to_all = true;
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Scripted {
        answers: Vec<Confirmation>,
        asked: usize,
    }

    impl Confirm for Scripted {
        fn confirm(&mut self, _query: &str, _caption: &str) -> Confirmation {
            self.asked += 1;
            self.answers.remove(0)
        }
    }

    #[test]
    fn test_yes_to_all_stops_prompting() {
        let mut prompter = Scripted {
            answers: vec![Confirmation::No, Confirmation::YesToAll],
            asked: 0,
        };
        let mut session = ConfirmSession::new(&mut prompter, false);
        assert!(!session.should_continue("q", "c"));
        assert!(session.should_continue("q", "c"));
        assert!(session.should_continue("q", "c"));
        drop(session);
        assert_eq!(prompter.asked, 2);
    }

    #[test]
    fn test_no_to_all_stops_prompting() {
        let mut prompter = Scripted {
            answers: vec![Confirmation::NoToAll],
            asked: 0,
        };
        let mut session = ConfirmSession::new(&mut prompter, false);
        assert!(!session.should_continue("q", "c"));
        assert!(!session.should_continue("q", "c"));
        drop(session);
        assert_eq!(prompter.asked, 1);
    }

    #[test]
    fn test_force_never_prompts() {
        let mut prompter = Scripted {
            answers: vec![],
            asked: 0,
        };
        let mut session = ConfirmSession::new(&mut prompter, true);
        assert!(session.should_continue("q", "c"));
        drop(session);
        assert_eq!(prompter.asked, 0);
    }
}
