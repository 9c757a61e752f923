//! Interactive, line-oriented front end over [`UserService`].
//!
//! Reads from any async buffered reader and writes to any async writer, so the
//! same loop drives stdin/stdout in production and byte buffers in tests.

use std::fmt::Display;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{error, info};

use crate::error::ServiceError;
use crate::users::{
    dto::UserRequest,
    mapper::{to_entity, to_patch},
    services::UserService,
    validation::{validate_create, validate_update},
};

const MENU: &str = "\nUser Management System\n\
1. Create User\n\
2. Find User by ID\n\
3. List All Users\n\
4. Update User\n\
5. Delete User\n\
6. Exit\n\
Enter your choice: ";

/// Why a command stopped early.
enum Abort {
    /// Input is exhausted; end the session.
    Eof,
    /// Print this and go back to the menu.
    Message(String),
    /// Reading or writing the terminal failed; the session cannot go on.
    Io(std::io::Error),
}

impl From<std::io::Error> for Abort {
    fn from(e: std::io::Error) -> Self {
        Abort::Io(e)
    }
}

pub struct Console<R, W> {
    users: UserService,
    input: R,
    output: W,
}

impl<R, W> Console<R, W>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    pub fn new(users: UserService, input: R, output: W) -> Self {
        Self {
            users,
            input,
            output,
        }
    }

    #[cfg(test)]
    pub fn into_output(self) -> W {
        self.output
    }

    /// Runs the menu until the user picks Exit or input ends.
    pub async fn run(&mut self) -> std::io::Result<()> {
        info!("console session started");
        loop {
            self.write(MENU).await?;
            let Some(line) = self.read_line().await? else {
                break;
            };

            let choice = match line.trim().parse::<u32>() {
                Ok(c) => c,
                Err(_) => {
                    self.write("Invalid input. Please enter a number.\n").await?;
                    continue;
                }
            };

            let outcome = match choice {
                1 => self.create_user().await,
                2 => self.find_user().await,
                3 => self.list_users().await,
                4 => self.update_user().await,
                5 => self.delete_user().await,
                6 => {
                    self.write("Exiting...\n").await?;
                    break;
                }
                _ => Err(Abort::Message("Invalid choice. Please try again.".into())),
            };

            match outcome {
                Ok(()) => {}
                Err(Abort::Message(msg)) => self.write(&format!("{msg}\n")).await?,
                Err(Abort::Eof) => break,
                Err(Abort::Io(e)) => {
                    error!(error = %e, "console i/o failed");
                    return Err(e);
                }
            }
        }
        self.output.flush().await?;
        info!("console session ended");
        Ok(())
    }

    async fn create_user(&mut self) -> Result<(), Abort> {
        let name = self.prompt("Enter name: ").await?;
        let email = self.prompt("Enter email: ").await?;
        let age = parse_number::<i32>(&self.prompt("Enter age: ").await?, "Error creating user")?;

        let req = UserRequest {
            name: Some(name),
            email: Some(email),
            age: Some(age),
        };
        validate_create(&req).map_err(|e| describe("Error creating user", ServiceError::from(e)))?;

        let created = self
            .users
            .create_user(to_entity(&req))
            .await
            .map_err(|e| describe("Error creating user", e))?;
        self.say(format!("User created successfully with ID: {}", created.id))
            .await
    }

    async fn find_user(&mut self) -> Result<(), Abort> {
        let id = self.prompt_id("Enter user ID: ", "Error finding user").await?;
        let user = self
            .users
            .get_user_by_id(id)
            .await
            .map_err(|e| describe("Error finding user", e))?;
        self.say(format!("User found: {user}")).await
    }

    async fn list_users(&mut self) -> Result<(), Abort> {
        let users = self
            .users
            .get_all_users()
            .await
            .map_err(|e| describe("Error listing users", e))?;
        if users.is_empty() {
            return self.say("No users found.").await;
        }
        self.say("List of Users:").await?;
        for user in users {
            self.say(user).await?;
        }
        Ok(())
    }

    async fn update_user(&mut self) -> Result<(), Abort> {
        let id = self
            .prompt_id("Enter user ID to update: ", "Error updating user")
            .await?;
        let current = self
            .users
            .get_user_by_id(id)
            .await
            .map_err(|e| describe("Error updating user", e))?;
        self.say(format!("Current user details: {current}")).await?;

        let name = self
            .prompt("Enter new name (leave blank to keep current): ")
            .await?;
        let email = self
            .prompt("Enter new email (leave blank to keep current): ")
            .await?;
        let age_input = self
            .prompt("Enter new age (leave blank to keep current): ")
            .await?;
        let age = if age_input.trim().is_empty() {
            None
        } else {
            Some(parse_number::<i32>(&age_input, "Error updating user")?)
        };

        let req = UserRequest {
            name: Some(name),
            email: Some(email),
            age,
        };
        validate_update(&req).map_err(|e| describe("Error updating user", ServiceError::from(e)))?;

        self.users
            .update_user(id, to_patch(req))
            .await
            .map_err(|e| describe("Error updating user", e))?;
        self.say("User updated successfully.").await
    }

    async fn delete_user(&mut self) -> Result<(), Abort> {
        let id = self
            .prompt_id("Enter user ID to delete: ", "Error deleting user")
            .await?;
        self.users
            .delete_user(id)
            .await
            .map_err(|e| describe("Error deleting user", e))?;
        self.say("User deleted successfully.").await
    }

    async fn prompt(&mut self, text: &str) -> Result<String, Abort> {
        self.write(text).await?;
        self.read_line().await?.ok_or(Abort::Eof)
    }

    async fn prompt_id(&mut self, text: &str, context: &str) -> Result<i64, Abort> {
        let line = self.prompt(text).await?;
        parse_number::<i64>(&line, context)
    }

    async fn say(&mut self, line: impl Display) -> Result<(), Abort> {
        self.write(&format!("{line}\n")).await?;
        Ok(())
    }

    async fn write(&mut self, text: &str) -> std::io::Result<()> {
        self.output.write_all(text.as_bytes()).await?;
        self.output.flush().await
    }

    /// Next line without its terminator, or `None` at end of input.
    async fn read_line(&mut self) -> std::io::Result<Option<String>> {
        let mut buf = String::new();
        if self.input.read_line(&mut buf).await? == 0 {
            return Ok(None);
        }
        let trimmed = buf.trim_end_matches(['\r', '\n']).len();
        buf.truncate(trimmed);
        Ok(Some(buf))
    }
}

fn parse_number<T: std::str::FromStr>(raw: &str, context: &str) -> Result<T, Abort> {
    raw.trim()
        .parse::<T>()
        .map_err(|_| Abort::Message(format!("{context}: '{}' is not a valid number", raw.trim())))
}

fn describe(context: &str, err: ServiceError) -> Abort {
    let msg = match err {
        ServiceError::NotFound(id) => format!("User not found with ID: {id}"),
        ServiceError::Validation(fields) => {
            let detail = fields
                .iter()
                .map(|(field, msg)| format!("{field} {msg}"))
                .collect::<Vec<_>>()
                .join(", ");
            format!("{context}: {detail}")
        }
        ServiceError::DuplicateEmail(email) => format!("{context}: email already in use: {email}"),
        ServiceError::Store(e) => {
            error!(error = ?e, "{context}");
            format!("{context}: storage is unavailable, see logs for details")
        }
    };
    Abort::Message(msg)
}
