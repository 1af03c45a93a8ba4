//! Interactive text menus
//!
//! The console reads one line per prompt from any [`BufRead`] and writes to
//! any [`Write`], so a whole session can be scripted. End of input on any
//! prompt ends the session as if Exit had been chosen.
//!
//! Recoverable errors are reported and the menu is shown again. Anything else
//! (storage or I/O failure) aborts the session and is returned to the caller.

use crate::session::VotingSession;
use crate::tally::Tally;
use crate::types::{Feedback, Registration, VoteRecord, Voter};
use crate::{Error, Result};
use std::io::{BufRead, Write};
use std::ops::ControlFlow;
use tabled::{Table, Tabled};

/// Menu loop reached end of input
type Flow = ControlFlow<()>;

pub struct Console<R, W> {
    session: VotingSession,
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Console<R, W> {
    pub fn new(session: VotingSession, input: R, output: W) -> Self {
        Self {
            session,
            input,
            output,
        }
    }

    pub fn session(&self) -> &VotingSession {
        &self.session
    }

    /// Hand back the session and the output sink
    pub fn into_parts(self) -> (VotingSession, W) {
        (self.session, self.output)
    }

    /// Run the top-level menu until Exit or end of input
    pub fn run(&mut self) -> Result<()> {
        writeln!(self.output, "Welcome to the Electronic Voting System\n")?;

        loop {
            writeln!(self.output, "Login as:")?;
            writeln!(self.output, "1. Voter")?;
            writeln!(self.output, "2. Election Commission")?;
            writeln!(self.output, "0. Exit")?;

            let Some(choice) = self.prompt("Enter your choice: ")? else {
                break;
            };

            let flow = match choice.trim() {
                "1" => self.voter_menu()?,
                "2" => self.commission_menu()?,
                "0" => break,
                _ => {
                    writeln!(self.output, "Invalid choice! Please try again.\n")?;
                    Flow::Continue(())
                }
            };
            if flow.is_break() {
                break;
            }
        }

        writeln!(self.output, "Exiting the system. Thank you!")?;
        self.output.flush()?;
        tracing::debug!("console session ended");
        Ok(())
    }

    fn voter_menu(&mut self) -> Result<Flow> {
        loop {
            writeln!(self.output, "Voter Menu")?;
            writeln!(self.output, "1. Generate Voter ID")?;
            writeln!(self.output, "2. Cast Vote")?;
            writeln!(self.output, "3. Leave Feedback")?;
            writeln!(self.output, "0. Go to Previous Menu")?;

            let Some(choice) = self.prompt("Enter your choice: ")? else {
                return Ok(Flow::Break(()));
            };

            let flow = match choice.trim() {
                "1" => self.generate_voter_id()?,
                "2" => self.cast_vote()?,
                "3" => self.leave_feedback()?,
                "0" => return Ok(Flow::Continue(())),
                _ => {
                    writeln!(self.output, "Invalid choice! Please try again.\n")?;
                    Flow::Continue(())
                }
            };
            if flow.is_break() {
                return Ok(flow);
            }
        }
    }

    fn commission_menu(&mut self) -> Result<Flow> {
        loop {
            writeln!(self.output, "Election Commission Menu")?;
            writeln!(self.output, "1. View Registered Voters")?;
            writeln!(self.output, "2. View Votes")?;
            writeln!(self.output, "3. View Feedbacks")?;
            writeln!(self.output, "4. Tally Votes")?;
            writeln!(self.output, "5. Declare Results")?;
            writeln!(self.output, "0. Go to Previous Menu")?;

            let Some(choice) = self.prompt("Enter your choice: ")? else {
                return Ok(Flow::Break(()));
            };

            let report = match choice.trim() {
                "1" => render_voters(&self.session.registered_voters()?),
                "2" => render_votes(&self.session.votes()?),
                "3" => render_feedbacks(&self.session.feedbacks()?),
                "4" => render_tally(self.session.tally()),
                "5" => format!("Election Results:\n{}\n", self.session.results()),
                "0" => return Ok(Flow::Continue(())),
                _ => "Invalid choice! Please try again.\n".to_string(),
            };
            writeln!(self.output, "{report}")?;
        }
    }

    fn generate_voter_id(&mut self) -> Result<Flow> {
        let Some(name) = self.prompt("Enter your name: ")? else {
            return Ok(Flow::Break(()));
        };

        let age = loop {
            let Some(age) = self.prompt("Enter your age: ")? else {
                return Ok(Flow::Break(()));
            };
            match age.trim().parse::<u32>() {
                Ok(age) => break age,
                Err(_) => writeln!(self.output, "Please enter a valid age.")?,
            }
        };

        let Some(city) = self.prompt("Enter your city: ")? else {
            return Ok(Flow::Break(()));
        };
        let Some(state) = self.prompt("Enter your state: ")? else {
            return Ok(Flow::Break(()));
        };

        let registration = Registration {
            name,
            age,
            city,
            state,
        };
        match self.session.register(registration) {
            Ok(voter_id) => writeln!(self.output, "Your unique Voter ID is: {voter_id}\n")?,
            Err(err) => self.report(err)?,
        }
        Ok(Flow::Continue(()))
    }

    fn cast_vote(&mut self) -> Result<Flow> {
        let Some(voter_id) = self.prompt("Enter your Voter ID: ")? else {
            return Ok(Flow::Break(()));
        };
        let voter_id = voter_id.trim().to_string();

        if let Err(err) = self.session.ensure_can_vote(&voter_id) {
            self.report(err)?;
            return Ok(Flow::Continue(()));
        }

        writeln!(self.output, "Candidates:")?;
        let options: Vec<String> = self
            .session
            .ballot()
            .numbered()
            .map(|(number, label)| format!("{number}. {label}"))
            .collect();
        for option in options {
            writeln!(self.output, "{option}")?;
        }

        let choice = loop {
            let Some(input) = self.prompt("Enter the number corresponding to your choice: ")?
            else {
                return Ok(Flow::Break(()));
            };
            match self.session.ballot().parse_choice(&input) {
                Ok(choice) => break choice,
                Err(Error::InvalidInput { message }) => {
                    writeln!(self.output, "Invalid choice! {message}. Please try again.")?
                }
                Err(err) => return Err(err),
            }
        };

        match self.session.cast_vote(&voter_id, choice) {
            Ok(_) => writeln!(self.output, "Your vote has been cast successfully.\n")?,
            Err(err) => self.report(err)?,
        }
        Ok(Flow::Continue(()))
    }

    fn leave_feedback(&mut self) -> Result<Flow> {
        let Some(text) = self.prompt("Please leave your feedback: ")? else {
            return Ok(Flow::Break(()));
        };
        self.session.leave_feedback(text)?;
        writeln!(self.output, "Thank you for your feedback!\n")?;
        Ok(Flow::Continue(()))
    }

    /// Tell the user about a recoverable error, pass anything else up
    fn report(&mut self, err: Error) -> Result<()> {
        let message = match &err {
            Error::Ineligible { minimum, .. } => {
                format!("Sorry, you must be at least {minimum} years old to vote.")
            }
            Error::DuplicateVote { .. } => {
                "You have already voted. Duplicate voting is not allowed.".to_string()
            }
            Error::UnknownVoterId { .. } => {
                "Invalid Voter ID! Please generate a valid Voter ID first.".to_string()
            }
            Error::InvalidInput { message } => format!("Invalid input! {message}."),
            _ => return Err(err),
        };
        writeln!(self.output, "{message}\n")?;
        Ok(())
    }

    /// Print `message` and read one line without its line ending.
    ///
    /// `None` means end of input.
    fn prompt(&mut self, message: &str) -> Result<Option<String>> {
        write!(self.output, "{message}")?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        let trimmed = line.trim_end_matches(['\r', '\n']).len();
        line.truncate(trimmed);
        Ok(Some(line))
    }
}

#[derive(Tabled)]
struct VoterRow {
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "State")]
    state: String,
    #[tabled(rename = "Voter ID")]
    voter_id: String,
}

/// Table of registered voters
pub fn render_voters(voters: &[Voter]) -> String {
    let rows = voters.iter().map(|v| VoterRow {
        name: v.name.clone(),
        state: v.state.clone(),
        voter_id: v.voter_id.clone(),
    });
    format!("Registered Voters:\n{}\n", Table::new(rows))
}

/// One line per vote with its time and digest
pub fn render_votes(votes: &[VoteRecord]) -> String {
    let mut out = String::from("Votes with Timestamps and Hashes:\n");
    for vote in votes {
        out.push_str(&format!(
            "Voter ID: {} | Time: {} | Hash: {}\n",
            vote.voter_id,
            vote.timestamp_text(),
            vote.digest
        ));
    }
    out
}

pub fn render_feedbacks(feedbacks: &[Feedback]) -> String {
    let mut out = String::from("Feedbacks:\n");
    for feedback in feedbacks {
        out.push_str(&format!("- {}\n", feedback.text));
    }
    out
}

pub fn render_tally(tally: &Tally) -> String {
    let mut out = String::from("Vote tallying...\n");
    for entry in tally.entries() {
        out.push_str(&format!("{entry}\n"));
    }
    out
}
