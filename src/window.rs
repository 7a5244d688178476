// The dashboard's window, drawn with `iced`: a status label on top, a
// read-only output pane and the button column. A button that needs input
// swaps the column for a small form; submitting it loads the answers into
// `WindowPrompt` and presses the button on the dashboard. Deletion is
// confirmed with a native message box.

use iced::widget::{button, checkbox, column, container, row, scrollable, text, text_input, Column};
use iced::{Element, Length, Task};
use rfd::{MessageButtons, MessageDialog, MessageLevel};
use std::collections::VecDeque;
use std::io;
use std::str::FromStr;
use tracing::debug;

use crate::config::Settings;
use crate::dashboard::{Dashboard, BUTTONS, TITLE};
use crate::mailbox::Connector;
use crate::ui::Prompt;

/// One value entered in a form, in the order the dashboard asks for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Answer {
    Text(String),
    Flag(bool),
}

/// Answers the dashboard's questions from the last submitted form. Yes/no
/// questions the form did not cover go to a native message box.
#[derive(Default)]
pub struct WindowPrompt {
    answers: VecDeque<Answer>,
}

impl WindowPrompt {
    pub fn load(&mut self, answers: Vec<Answer>) {
        self.answers = answers.into();
    }

    fn next_text(&mut self, label: &str) -> io::Result<String> {
        match self.answers.pop_front() {
            Some(Answer::Text(value)) => Ok(value),
            _ => Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("no value for '{}'", label),
            )),
        }
    }

}

fn parse_number<T: FromStr>(label: &str, value: &str) -> io::Result<T> {
    value.trim().parse().map_err(|_| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("'{}' is not a valid number for '{}'", value.trim(), label),
        )
    })
}

impl Prompt for WindowPrompt {
    fn read_line(&mut self, _prompt: &str) -> io::Result<Option<String>> {
        Ok(None)
    }

    fn text(&mut self, label: &str, default: Option<&str>) -> io::Result<String> {
        let value = self.next_text(label)?;
        match default {
            Some(d) if value.trim().is_empty() => Ok(d.to_string()),
            _ => Ok(value),
        }
    }

    fn password(&mut self, label: &str) -> io::Result<String> {
        self.next_text(label)
    }

    fn port(&mut self, label: &str, default: u16) -> io::Result<u16> {
        let value = self.next_text(label)?;
        if value.trim().is_empty() {
            return Ok(default);
        }
        parse_number(label, &value)
    }

    fn number(&mut self, label: &str) -> io::Result<u32> {
        let value = self.next_text(label)?;
        parse_number(label, &value)
    }

    fn confirm(&mut self, label: &str, _default: bool) -> io::Result<bool> {
        if let Some(Answer::Flag(value)) = self.answers.front() {
            let value = *value;
            self.answers.pop_front();
            return Ok(value);
        }
        Ok(MessageDialog::new()
            .set_title(TITLE)
            .set_description(label)
            .set_buttons(MessageButtons::YesNo)
            .set_level(MessageLevel::Info)
            .show())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Field {
    Text {
        label: &'static str,
        value: String,
        secret: bool,
    },
    Flag {
        label: &'static str,
        value: bool,
    },
}

impl Field {
    fn text(label: &'static str, value: impl Into<String>) -> Self {
        Field::Text {
            label,
            value: value.into(),
            secret: false,
        }
    }

    fn secret(label: &'static str) -> Self {
        Field::Text {
            label,
            value: String::new(),
            secret: true,
        }
    }

    fn answer(self) -> Answer {
        match self {
            Field::Text { value, .. } => Answer::Text(value),
            Field::Flag { value, .. } => Answer::Flag(value),
        }
    }
}

/// The form behind a button, pre-filled from the settings. Field order
/// follows the order the dashboard asks its questions.
pub fn fields_for(button: &str, settings: &Settings) -> Vec<Field> {
    let username = settings.username.clone().unwrap_or_default();
    match button {
        "Connect" => vec![
            Field::text("Server", settings.server.clone().unwrap_or_default()),
            Field::text("Port", settings.port.to_string()),
            Field::Flag {
                label: "Use SSL?",
                value: settings.use_tls,
            },
        ],
        "Login" => vec![Field::text("Username", username), Field::secret("Password")],
        "Select Folder" => vec![Field::text("Folder name", "")],
        "Download Attachments" => vec![Field::text("Message ID", "")],
        "Delete Emails" => vec![Field::text("Message IDs (comma-separated)", "")],
        "Upload Email" => vec![
            Field::text("Folder", settings.upload_folder.clone()),
            Field::text("Subject", ""),
            Field::text("Body", ""),
            Field::text("Sender email", username),
            Field::text("Recipient emails (comma-separated)", ""),
        ],
        _ => Vec::new(),
    }
}

#[derive(Debug, Clone)]
pub struct Form {
    pub button: &'static str,
    pub fields: Vec<Field>,
}

impl Form {
    fn answers(self) -> Vec<Answer> {
        self.fields.into_iter().map(Field::answer).collect()
    }

    fn view(&self) -> Element<'_, Message> {
        let mut form: Column<'_, Message> = column![text(self.button).size(18)].spacing(8);
        for (index, field) in self.fields.iter().enumerate() {
            let widget: Element<'_, Message> = match field {
                Field::Text { label, value, secret } => column![
                    text(*label).size(14),
                    text_input(label, value)
                        .secure(*secret)
                        .on_input(move |value| Message::Edit(index, value))
                        .on_submit(Message::Submit),
                ]
                .spacing(2)
                .into(),
                Field::Flag { label, value } => checkbox(*label, *value)
                    .on_toggle(move |on| Message::Toggle(index, on))
                    .into(),
            };
            form = form.push(widget);
        }
        form.push(
            row![
                button(text("OK")).on_press(Message::Submit),
                button(text("Cancel")).on_press(Message::Cancel),
            ]
            .spacing(8),
        )
        .width(Length::Fixed(280.0))
        .into()
    }
}

#[derive(Debug, Clone)]
pub enum Message {
    Press(&'static str),
    Edit(usize, String),
    Toggle(usize, bool),
    Submit,
    Cancel,
}

pub struct Window {
    dashboard: Dashboard<WindowPrompt, Vec<u8>>,
    log: Vec<String>,
    form: Option<Form>,
}

impl Window {
    pub fn new(dashboard: Dashboard<WindowPrompt, Vec<u8>>) -> Self {
        Window {
            dashboard,
            log: Vec::new(),
            form: None,
        }
    }

    pub fn status(&self) -> &str {
        self.dashboard.status()
    }

    /// Lines shown in the output pane.
    pub fn log(&self) -> &[String] {
        &self.log
    }

    /// The open form, if a button is waiting for input.
    pub fn form(&self) -> Option<&Form> {
        self.form.as_ref()
    }

    pub fn update(&mut self, message: Message) -> Task<Message> {
        match message {
            Message::Press(button) => {
                if self.dashboard.asks_for_input(button) {
                    let fields = fields_for(button, self.dashboard.settings());
                    self.form = Some(Form { button, fields });
                } else {
                    return self.run(button, Vec::new());
                }
            }
            Message::Edit(index, input) => {
                if let Some(Field::Text { value, .. }) = self.field_mut(index) {
                    *value = input;
                }
            }
            Message::Toggle(index, on) => {
                if let Some(Field::Flag { value, .. }) = self.field_mut(index) {
                    *value = on;
                }
            }
            Message::Submit => {
                if let Some(form) = self.form.take() {
                    let button = form.button;
                    return self.run(button, form.answers());
                }
            }
            Message::Cancel => self.form = None,
        }
        Task::none()
    }

    fn field_mut(&mut self, index: usize) -> Option<&mut Field> {
        self.form.as_mut().and_then(|form| form.fields.get_mut(index))
    }

    fn run(&mut self, button: &'static str, answers: Vec<Answer>) -> Task<Message> {
        debug!(button, answers = answers.len(), "window action");
        self.dashboard.prompt_mut().load(answers);
        let result = self.dashboard.press(button);

        let written = self.dashboard.take_output();
        self.log
            .extend(String::from_utf8_lossy(&written).lines().map(String::from));
        if let Err(e) = result {
            self.log.push(format!("{} failed: {}", button, e));
        }

        if button == "Quit" {
            return iced::exit();
        }
        Task::none()
    }

    pub fn view(&self) -> Element<'_, Message> {
        let status = text(self.dashboard.status()).size(16);

        let lines: Column<'_, Message> = column(
            self.log
                .iter()
                .map(|line| text(line.as_str()).size(14).into()),
        )
        .spacing(2)
        .padding(8);
        let output = scrollable(lines).width(Length::Fill).height(Length::Fill);

        let side = match &self.form {
            Some(form) => form.view(),
            None => {
                let buttons: Column<'_, Message> = column(BUTTONS.iter().map(|label| {
                    button(text(*label))
                        .on_press(Message::Press(*label))
                        .width(Length::Fill)
                        .into()
                }));
                buttons.spacing(6).width(Length::Fixed(200.0)).into()
            }
        };

        container(column![status, row![output, side].spacing(12).height(Length::Fill)].spacing(12))
            .padding(12)
            .width(Length::Fill)
            .height(Length::Fill)
            .into()
    }
}

/// Open the dashboard window and block until it is closed.
pub fn open(settings: Settings, connector: Box<dyn Connector>) -> iced::Result {
    let dashboard = Dashboard::new(WindowPrompt::default(), Vec::new(), settings, connector);
    iced::application(TITLE, Window::update, Window::view)
        .window_size((820.0, 560.0))
        .run_with(move || (Window::new(dashboard), Task::none()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(values: &[&str]) -> Vec<Answer> {
        values.iter().map(|v| Answer::Text(v.to_string())).collect()
    }

    #[test]
    fn connect_form_is_seeded_from_settings() {
        let settings = Settings {
            server: Some("imap.example.org".into()),
            ..Settings::default()
        };
        let fields = fields_for("Connect", &settings);
        assert_eq!(fields[0], Field::text("Server", "imap.example.org"));
        assert_eq!(fields[1], Field::text("Port", "993"));
        assert_eq!(
            fields[2],
            Field::Flag {
                label: "Use SSL?",
                value: true
            }
        );
        assert!(fields_for("List Folders", &settings).is_empty());
    }

    #[test]
    fn password_field_is_masked() {
        let fields = fields_for("Login", &Settings::default());
        assert!(matches!(fields[1], Field::Text { secret: true, .. }));
    }

    #[test]
    fn prompt_answers_in_order_with_defaults() {
        let mut prompt = WindowPrompt::default();
        prompt.load(vec![
            Answer::Text("".into()),
            Answer::Text(" 143 ".into()),
            Answer::Flag(false),
        ]);
        assert_eq!(prompt.text("Server", Some("imap.test")).unwrap(), "imap.test");
        assert_eq!(prompt.port("Port", 993).unwrap(), 143);
        assert!(!prompt.confirm("Use SSL?", true).unwrap());
    }

    #[test]
    fn bad_number_is_an_input_error() {
        let mut prompt = WindowPrompt::default();
        prompt.load(texts(&["twelve"]));
        let err = prompt.number("Message ID").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
        assert!(err.to_string().contains("twelve"));
    }

    #[test]
    fn missing_answer_is_an_error() {
        let mut prompt = WindowPrompt::default();
        assert!(prompt.password("Password").is_err());
    }
}
