use std::{cmp, io, sync::mpsc, thread, time::Duration};

use anyhow::{Context, Result};
use chrono::Local;
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap},
    Frame, Terminal,
};
use tracing::{info, warn};
use krishi_core::{
    error::Error,
    models::{ApplicationStatus, Crop, Subsidy, User},
    portal::Portal,
    session::Principal,
    store::UserStore,
};

use crate::banner;

const TICK_RATE: Duration = Duration::from_millis(250);
const MAX_INPUT_LEN: usize = 160;
const LABEL_WIDTH: usize = 13;

const LANDING_ITEMS: [&str; 3] = ["Log In", "Register", "Exit"];
const FARMER_ITEMS: [&str; 6] = [
    "My Land Details",
    "Crop Prices",
    "Subsidies",
    "My Applications",
    "Growing Steps",
    "Log Out",
];
const ADMIN_ITEMS: [&str; 5] = [
    "Manage Crops",
    "Manage Subsidies",
    "Registered Farmers",
    "Applications",
    "Log Out",
];

#[derive(Debug, Clone)]
struct Theme {
    primary_fg: Color,
    accent: Color,
    muted: Color,
    selection_bg: Color,
    success: Color,
    warning: Color,
    danger: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            primary_fg: Color::White,
            accent: Color::Green,
            muted: Color::DarkGray,
            selection_bg: Color::DarkGray,
            success: Color::Green,
            warning: Color::Yellow,
            danger: Color::Red,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Screen {
    Landing,
    FarmerHome,
    AdminHome,
    LandDetails,
    CropPrices,
    Subsidies,
    MyApplications,
    GrowingSteps,
    ManageCrops,
    ManageSubsidies,
    FarmerRoster,
    Applications,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FormKind {
    Login,
    Register,
    LandDetails,
    AddCrop,
    UpdateCropPrice(u32),
    AddSubsidy,
    UpdateSubsidy(u32),
}

#[derive(Debug, Clone)]
struct FormField {
    label: &'static str,
    value: String,
    cursor: usize,
    masked: bool,
}

impl FormField {
    fn new(label: &'static str) -> Self {
        Self {
            label,
            value: String::new(),
            cursor: 0,
            masked: false,
        }
    }

    fn masked(label: &'static str) -> Self {
        Self {
            masked: true,
            ..Self::new(label)
        }
    }

    fn with_value(label: &'static str, value: String) -> Self {
        let cursor = value.chars().count();
        Self {
            label,
            value,
            cursor,
            masked: false,
        }
    }

    fn char_count(&self) -> usize {
        self.value.chars().count()
    }

    // cursor is a char index; prefilled values may contain multi-byte text
    fn byte_index(&self) -> usize {
        self.value
            .char_indices()
            .nth(self.cursor)
            .map(|(index, _)| index)
            .unwrap_or(self.value.len())
    }

    fn insert(&mut self, ch: char) {
        if self.char_count() >= MAX_INPUT_LEN || ch.is_control() || ch == '|' {
            return;
        }
        let index = self.byte_index();
        self.value.insert(index, ch);
        self.cursor += 1;
    }

    fn backspace(&mut self) {
        if self.cursor > 0 {
            self.cursor -= 1;
            let index = self.byte_index();
            self.value.remove(index);
        }
    }

    fn delete(&mut self) {
        if self.cursor < self.char_count() {
            let index = self.byte_index();
            self.value.remove(index);
        }
    }

    fn move_cursor(&mut self, delta: isize) {
        let len = self.char_count() as isize;
        let mut next = self.cursor as isize + delta;
        if next < 0 {
            next = 0;
        } else if next > len {
            next = len;
        }
        self.cursor = next as usize;
    }

    fn move_home(&mut self) {
        self.cursor = 0;
    }

    fn move_end(&mut self) {
        self.cursor = self.char_count();
    }

    fn display(&self) -> String {
        if self.masked {
            "•".repeat(self.char_count())
        } else {
            self.value.clone()
        }
    }
}

#[derive(Debug, Clone)]
struct FormModal {
    title: String,
    kind: FormKind,
    fields: Vec<FormField>,
    focus: usize,
}

impl FormModal {
    fn login() -> Self {
        Self {
            title: "Log In".to_string(),
            kind: FormKind::Login,
            fields: vec![FormField::new("Username"), FormField::masked("Password")],
            focus: 0,
        }
    }

    fn register() -> Self {
        Self {
            title: "Register".to_string(),
            kind: FormKind::Register,
            fields: vec![
                FormField::new("Username"),
                FormField::masked("Password"),
                FormField::new("Full name"),
            ],
            focus: 0,
        }
    }

    fn land_details(user: &User) -> Self {
        let size = if user.has_land_details() {
            user.land_size.to_string()
        } else {
            String::new()
        };
        Self {
            title: "Update Land Details".to_string(),
            kind: FormKind::LandDetails,
            fields: vec![
                FormField::with_value("Land size", size),
                FormField::with_value("Location", user.location.clone()),
                FormField::with_value("Soil type", user.soil_type.clone()),
            ],
            focus: 0,
        }
    }

    fn add_crop() -> Self {
        Self {
            title: "Add Crop".to_string(),
            kind: FormKind::AddCrop,
            fields: vec![FormField::new("Crop name"), FormField::new("Price")],
            focus: 0,
        }
    }

    fn update_crop_price(id: u32, crop: &Crop) -> Self {
        Self {
            title: format!("Update Price - {}", crop.name),
            kind: FormKind::UpdateCropPrice(id),
            fields: vec![FormField::with_value("Price", crop.price.to_string())],
            focus: 0,
        }
    }

    fn add_subsidy() -> Self {
        Self {
            title: "Add Subsidy".to_string(),
            kind: FormKind::AddSubsidy,
            fields: vec![FormField::new("Description"), FormField::new("Details")],
            focus: 0,
        }
    }

    fn update_subsidy(id: u32, subsidy: &Subsidy) -> Self {
        Self {
            title: format!("Update Subsidy {id}"),
            kind: FormKind::UpdateSubsidy(id),
            fields: vec![
                FormField::with_value("Description", subsidy.description.clone()),
                FormField::with_value("Details", subsidy.details.clone()),
            ],
            focus: 0,
        }
    }

    fn value(&self, index: usize) -> &str {
        &self.fields[index].value
    }

    fn focused_mut(&mut self) -> &mut FormField {
        &mut self.fields[self.focus]
    }

    fn next_field(&mut self) {
        if self.focus + 1 < self.fields.len() {
            self.focus += 1;
        } else {
            self.focus = 0;
        }
    }

    fn prev_field(&mut self) {
        if self.focus == 0 {
            self.focus = self.fields.len() - 1;
        } else {
            self.focus -= 1;
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConfirmKind {
    ApplySubsidy(u32),
    RemoveCrop(u32),
    RemoveSubsidy(u32),
}

#[derive(Debug, Clone)]
struct ConfirmModal {
    message: String,
    kind: ConfirmKind,
}

#[derive(Debug, Clone)]
struct ReportRow {
    username: String,
    full_name: String,
    subsidy_id: u32,
    description: String,
    status: ApplicationStatus,
}

enum AppEvent {
    Input(Event),
    Tick,
}

struct UiState {
    status: String,
    should_quit: bool,
    menu_cursor: usize,
    list_cursor: usize,
    list_offset: usize,
    list_height: usize,
}

impl Default for UiState {
    fn default() -> Self {
        Self {
            status: "Ready".to_string(),
            should_quit: false,
            menu_cursor: 0,
            list_cursor: 0,
            list_offset: 0,
            list_height: 1,
        }
    }
}

impl UiState {
    fn set_status(&mut self, message: String) {
        self.status = message;
    }

    fn move_menu_cursor(&mut self, delta: isize, options: usize) {
        if options == 0 {
            self.menu_cursor = 0;
            return;
        }
        let mut idx = self.menu_cursor as isize + delta;
        if idx < 0 {
            idx = 0;
        } else if idx >= options as isize {
            idx = options as isize - 1;
        }
        self.menu_cursor = idx as usize;
    }

    fn move_list_cursor(&mut self, delta: isize, total: usize) {
        if total == 0 {
            self.list_cursor = 0;
            self.list_offset = 0;
            return;
        }
        let mut idx = self.list_cursor as isize + delta;
        if idx < 0 {
            idx = 0;
        } else if idx >= total as isize {
            idx = total as isize - 1;
        }
        self.list_cursor = idx as usize;
        self.ensure_list_visible(total);
    }

    fn reset_list(&mut self) {
        self.list_cursor = 0;
        self.list_offset = 0;
    }

    fn clamp_list(&mut self, total: usize) {
        if total == 0 {
            self.reset_list();
        } else if self.list_cursor >= total {
            self.list_cursor = total - 1;
        }
    }

    fn ensure_list_visible(&mut self, total: usize) {
        if total == 0 || self.list_height == 0 {
            self.list_offset = 0;
            return;
        }
        let height = self.list_height;
        let max_offset = total.saturating_sub(height);

        if self.list_cursor < self.list_offset {
            self.list_offset = self.list_cursor;
        } else if self.list_cursor >= self.list_offset + height {
            self.list_offset = self.list_cursor + 1 - height;
        }

        if self.list_offset > max_offset {
            self.list_offset = max_offset;
        }
    }
}

/// High-level application state for the portal TUI.
pub struct KrishiApp {
    portal: Portal,
    store: UserStore,
    session: Option<Principal>,
    screen: Screen,
    state: UiState,
    theme: Theme,
    form: Option<FormModal>,
    confirm: Option<ConfirmModal>,
    report_rows: Vec<ReportRow>,
}

impl KrishiApp {
    pub fn new(portal: Portal, store: UserStore) -> Self {
        Self {
            portal,
            store,
            session: None,
            screen: Screen::Landing,
            state: UiState::default(),
            theme: Theme::default(),
            form: None,
            confirm: None,
            report_rows: Vec::new(),
        }
    }

    pub fn run(&mut self) -> Result<()> {
        info!(accounts = self.portal.users().len(), "portal ready");
        self.state.set_status(format!(
            "{} accounts on file. Log in or register to begin.",
            self.portal.users().len()
        ));

        let mut stdout = io::stdout();
        enable_raw_mode().context("failed to enter raw mode")?;
        execute!(stdout, EnterAlternateScreen).context("failed to enter alternate screen")?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend).context("failed to create terminal")?;
        terminal.hide_cursor()?;
        terminal.clear()?;

        let (event_tx, event_rx) = mpsc::channel::<AppEvent>();
        spawn_input_thread(event_tx);

        let run_result = self.event_loop(&mut terminal, event_rx);
        let restore_result = restore_terminal(&mut terminal);
        // records are written once, at shutdown, whatever ended the loop
        let save_result = self.save_records();
        run_result.and(restore_result).and(save_result)
    }

    fn event_loop(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
        events: mpsc::Receiver<AppEvent>,
    ) -> Result<()> {
        loop {
            terminal.draw(|frame| self.draw(frame))?;
            if self.state.should_quit {
                break;
            }
            match events.recv() {
                Ok(AppEvent::Input(Event::Key(key))) => self.handle_key(key),
                Ok(AppEvent::Input(_)) | Ok(AppEvent::Tick) => {}
                Err(_) => break,
            }
        }
        Ok(())
    }

    fn save_records(&self) -> Result<()> {
        self.store
            .save(self.portal.users())
            .context("failed to save account records")
    }

    fn notify(&mut self, outcome: Result<String, Error>) {
        match outcome {
            Ok(message) => self.state.set_status(message),
            Err(err) => {
                warn!(%err, "operation rejected");
                self.state.set_status(err.to_string());
            }
        }
    }

    fn quit(&mut self) {
        self.state.should_quit = true;
    }

    fn goto(&mut self, screen: Screen) {
        self.screen = screen;
        self.state.reset_list();
    }

    fn back_home(&mut self) {
        self.screen = match self.session.as_ref() {
            Some(principal) if principal.is_admin() => Screen::AdminHome,
            Some(_) => Screen::FarmerHome,
            None => Screen::Landing,
        };
        self.state.reset_list();
    }

    fn logout(&mut self) {
        if let Some(principal) = self.session.take() {
            info!(username = %principal.username(), "logged out");
        }
        self.screen = Screen::Landing;
        self.state.menu_cursor = 0;
        self.state.reset_list();
        self.state.set_status("Logged out.".to_string());
    }

    fn handle_key(&mut self, key: KeyEvent) {
        if self.confirm.is_some() {
            self.handle_confirm_key(key);
            return;
        }
        if self.form.is_some() {
            self.handle_form_key(key);
            return;
        }
        match self.screen {
            Screen::Landing => self.handle_landing_key(key),
            Screen::FarmerHome => self.handle_home_key(key, false),
            Screen::AdminHome => self.handle_home_key(key, true),
            Screen::LandDetails => self.handle_land_details_key(key),
            Screen::CropPrices | Screen::MyApplications | Screen::FarmerRoster => {
                self.handle_view_key(key)
            }
            Screen::Subsidies => self.handle_subsidies_key(key),
            Screen::GrowingSteps => self.handle_view_key(key),
            Screen::ManageCrops => self.handle_manage_crops_key(key),
            Screen::ManageSubsidies => self.handle_manage_subsidies_key(key),
            Screen::Applications => self.handle_applications_key(key),
        }
    }

    fn handle_landing_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc | KeyCode::Char('q') => self.quit(),
            KeyCode::Char('j') | KeyCode::Down => {
                self.state.move_menu_cursor(1, LANDING_ITEMS.len())
            }
            KeyCode::Char('k') | KeyCode::Up => {
                self.state.move_menu_cursor(-1, LANDING_ITEMS.len())
            }
            KeyCode::Enter => match self.state.menu_cursor {
                0 => {
                    self.form = Some(FormModal::login());
                    self.state.set_status("Enter your credentials.".to_string());
                }
                1 => {
                    self.form = Some(FormModal::register());
                    self.state.set_status("Choose a username and password.".to_string());
                }
                2 => self.quit(),
                _ => {}
            },
            _ => {}
        }
    }

    fn handle_home_key(&mut self, key: KeyEvent, admin: bool) {
        let items = if admin {
            ADMIN_ITEMS.len()
        } else {
            FARMER_ITEMS.len()
        };
        match key.code {
            KeyCode::Char('q') => self.quit(),
            KeyCode::Esc => self.logout(),
            KeyCode::Char('j') | KeyCode::Down => self.state.move_menu_cursor(1, items),
            KeyCode::Char('k') | KeyCode::Up => self.state.move_menu_cursor(-1, items),
            KeyCode::Enter => {
                if admin {
                    match self.state.menu_cursor {
                        0 => self.goto(Screen::ManageCrops),
                        1 => self.goto(Screen::ManageSubsidies),
                        2 => self.goto(Screen::FarmerRoster),
                        3 => {
                            self.refresh_report();
                            self.goto(Screen::Applications);
                        }
                        4 => self.logout(),
                        _ => {}
                    }
                } else {
                    match self.state.menu_cursor {
                        0 => self.goto(Screen::LandDetails),
                        1 => self.goto(Screen::CropPrices),
                        2 => self.goto(Screen::Subsidies),
                        3 => self.goto(Screen::MyApplications),
                        4 => self.goto(Screen::GrowingSteps),
                        5 => self.logout(),
                        _ => {}
                    }
                }
            }
            _ => {}
        }
    }

    fn handle_view_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => self.back_home(),
            KeyCode::Char('q') => self.quit(),
            KeyCode::Char('j') | KeyCode::Down => self.move_list(1),
            KeyCode::Char('k') | KeyCode::Up => self.move_list(-1),
            _ => {}
        }
    }

    fn handle_land_details_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => self.back_home(),
            KeyCode::Char('q') => self.quit(),
            KeyCode::Char('e') => {
                let Some(principal) = self.session.clone() else {
                    return;
                };
                match self.portal.profile(&principal) {
                    Ok(user) => {
                        self.form = Some(FormModal::land_details(user));
                        self.state.set_status("Update your land profile.".to_string());
                    }
                    Err(err) => self.state.set_status(err.to_string()),
                }
            }
            _ => {}
        }
    }

    fn handle_subsidies_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => self.back_home(),
            KeyCode::Char('q') => self.quit(),
            KeyCode::Char('j') | KeyCode::Down => self.move_list(1),
            KeyCode::Char('k') | KeyCode::Up => self.move_list(-1),
            KeyCode::Enter | KeyCode::Char('a') => {
                let id = self.state.list_cursor as u32 + 1;
                match self.portal.subsidies().get(id) {
                    Ok(subsidy) => {
                        self.confirm = Some(ConfirmModal {
                            message: format!("Apply for {}?", subsidy.description),
                            kind: ConfirmKind::ApplySubsidy(id),
                        });
                    }
                    Err(_) => self.state.set_status("No subsidy selected.".to_string()),
                }
            }
            _ => {}
        }
    }

    fn handle_manage_crops_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => self.back_home(),
            KeyCode::Char('q') => self.quit(),
            KeyCode::Char('j') | KeyCode::Down => self.move_list(1),
            KeyCode::Char('k') | KeyCode::Up => self.move_list(-1),
            KeyCode::Char('a') => {
                self.form = Some(FormModal::add_crop());
                self.state.set_status("Enter the new crop.".to_string());
            }
            KeyCode::Char('u') => {
                let id = self.state.list_cursor as u32 + 1;
                match self.portal.crops().get(id) {
                    Ok(crop) => {
                        self.form = Some(FormModal::update_crop_price(id, crop));
                        self.state.set_status("Enter the new price.".to_string());
                    }
                    Err(_) => self.state.set_status("No crop selected.".to_string()),
                }
            }
            KeyCode::Char('d') => {
                let id = self.state.list_cursor as u32 + 1;
                match self.portal.crops().get(id) {
                    Ok(crop) => {
                        self.confirm = Some(ConfirmModal {
                            message: format!("Remove crop {}?", crop.name),
                            kind: ConfirmKind::RemoveCrop(id),
                        });
                    }
                    Err(_) => self.state.set_status("No crop selected.".to_string()),
                }
            }
            _ => {}
        }
    }

    fn handle_manage_subsidies_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => self.back_home(),
            KeyCode::Char('q') => self.quit(),
            KeyCode::Char('j') | KeyCode::Down => self.move_list(1),
            KeyCode::Char('k') | KeyCode::Up => self.move_list(-1),
            KeyCode::Char('a') => {
                self.form = Some(FormModal::add_subsidy());
                self.state.set_status("Enter the new subsidy.".to_string());
            }
            KeyCode::Char('u') => {
                let id = self.state.list_cursor as u32 + 1;
                match self.portal.subsidies().get(id) {
                    Ok(subsidy) => {
                        self.form = Some(FormModal::update_subsidy(id, subsidy));
                        self.state.set_status("Edit description and details.".to_string());
                    }
                    Err(_) => self.state.set_status("No subsidy selected.".to_string()),
                }
            }
            KeyCode::Char('d') => {
                let id = self.state.list_cursor as u32 + 1;
                match self.portal.subsidies().get(id) {
                    Ok(subsidy) => {
                        self.confirm = Some(ConfirmModal {
                            message: format!(
                                "Remove {}? Applications referencing later subsidies will be renumbered.",
                                subsidy.description
                            ),
                            kind: ConfirmKind::RemoveSubsidy(id),
                        });
                    }
                    Err(_) => self.state.set_status("No subsidy selected.".to_string()),
                }
            }
            _ => {}
        }
    }

    fn handle_applications_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => self.back_home(),
            KeyCode::Char('q') => self.quit(),
            KeyCode::Char('j') | KeyCode::Down => self.move_list(1),
            KeyCode::Char('k') | KeyCode::Up => self.move_list(-1),
            KeyCode::Char('a') => self.decide_application(true),
            KeyCode::Char('r') => self.decide_application(false),
            _ => {}
        }
    }

    fn handle_form_key(&mut self, key: KeyEvent) {
        let mut submit = false;
        let mut cancel = false;
        if let Some(form) = self.form.as_mut() {
            match key.code {
                KeyCode::Esc => cancel = true,
                KeyCode::Enter => {
                    if form.focus + 1 < form.fields.len() {
                        form.next_field();
                    } else {
                        submit = true;
                    }
                }
                KeyCode::Tab | KeyCode::Down => form.next_field(),
                KeyCode::BackTab | KeyCode::Up => form.prev_field(),
                KeyCode::Left => form.focused_mut().move_cursor(-1),
                KeyCode::Right => form.focused_mut().move_cursor(1),
                KeyCode::Home => form.focused_mut().move_home(),
                KeyCode::End => form.focused_mut().move_end(),
                KeyCode::Backspace => form.focused_mut().backspace(),
                KeyCode::Delete => form.focused_mut().delete(),
                KeyCode::Char(ch) => {
                    if key.modifiers.is_empty() || key.modifiers == KeyModifiers::SHIFT {
                        form.focused_mut().insert(ch);
                    }
                }
                _ => {}
            }
        }

        if cancel {
            self.form = None;
            self.state.set_status("Cancelled.".to_string());
            return;
        }
        if submit {
            if let Some(form) = self.form.take() {
                self.submit_form(form);
            }
        }
    }

    fn submit_form(&mut self, form: FormModal) {
        match form.kind {
            FormKind::Login => {
                let username = form.value(0).trim().to_string();
                let password = form.value(1).to_string();
                match self.portal.login(&username, &password) {
                    Ok(principal) => {
                        let admin = principal.is_admin();
                        self.state
                            .set_status(format!("Welcome, {}!", principal.username()));
                        self.session = Some(principal);
                        self.screen = if admin {
                            Screen::AdminHome
                        } else {
                            Screen::FarmerHome
                        };
                        self.state.menu_cursor = 0;
                        self.state.reset_list();
                    }
                    Err(err) => {
                        warn!(username = %username, %err, "login rejected");
                        self.state.set_status(format!("Login failed: {err}"));
                    }
                }
            }
            FormKind::Register => {
                let username = form.value(0).trim().to_string();
                let password = form.value(1).to_string();
                let full_name = form.value(2).trim().to_string();
                let outcome = self
                    .portal
                    .register(&username, &password, &full_name)
                    .map(|_| "Registration successful. You can now log in.".to_string());
                self.notify(outcome);
            }
            FormKind::LandDetails => {
                let Ok(size) = form.value(0).trim().parse::<f64>() else {
                    self.state.set_status("Land size must be a number.".to_string());
                    self.form = Some(form);
                    return;
                };
                let location = form.value(1).trim().to_string();
                let soil_type = form.value(2).trim().to_string();
                let Some(principal) = self.session.clone() else {
                    return;
                };
                let outcome = self
                    .portal
                    .update_land_details(&principal, size, location, soil_type)
                    .map(|_| "Land details saved.".to_string());
                self.notify(outcome);
            }
            FormKind::AddCrop => {
                let name = form.value(0).trim().to_string();
                let Ok(price) = form.value(1).trim().parse::<f64>() else {
                    self.state.set_status("Price must be a number.".to_string());
                    self.form = Some(form);
                    return;
                };
                let Some(principal) = self.session.clone() else {
                    return;
                };
                let outcome = self
                    .portal
                    .add_crop(&principal, &name, price)
                    .map(|id| format!("Added {name} at position {id}."));
                self.notify(outcome);
            }
            FormKind::UpdateCropPrice(id) => {
                let Ok(price) = form.value(0).trim().parse::<f64>() else {
                    self.state.set_status("Price must be a number.".to_string());
                    self.form = Some(form);
                    return;
                };
                let Some(principal) = self.session.clone() else {
                    return;
                };
                let outcome = self
                    .portal
                    .update_crop_price(&principal, id, price)
                    .map(|_| format!("Updated price for crop {id}."));
                self.notify(outcome);
            }
            FormKind::AddSubsidy => {
                let description = form.value(0).trim().to_string();
                let details = form.value(1).trim().to_string();
                let Some(principal) = self.session.clone() else {
                    return;
                };
                let outcome = self
                    .portal
                    .add_subsidy(&principal, &description, &details)
                    .map(|id| format!("Added subsidy at position {id}."));
                self.notify(outcome);
            }
            FormKind::UpdateSubsidy(id) => {
                let description = form.value(0).trim().to_string();
                let details = form.value(1).trim().to_string();
                let Some(principal) = self.session.clone() else {
                    return;
                };
                let outcome = self
                    .portal
                    .update_subsidy(&principal, id, &description, &details)
                    .map(|_| format!("Updated subsidy {id}."));
                self.notify(outcome);
            }
        }
    }

    fn handle_confirm_key(&mut self, key: KeyEvent) {
        let Some(confirm) = self.confirm.take() else {
            return;
        };
        match key.code {
            KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => {
                self.run_confirmed(confirm.kind)
            }
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                self.state.set_status("Cancelled.".to_string());
            }
            _ => self.confirm = Some(confirm),
        }
    }

    fn run_confirmed(&mut self, kind: ConfirmKind) {
        let Some(principal) = self.session.clone() else {
            return;
        };
        match kind {
            ConfirmKind::ApplySubsidy(id) => {
                let outcome = self
                    .portal
                    .apply(&principal, id)
                    .map(|_| format!("Applied for subsidy {id}. Status: Pending."));
                self.notify(outcome);
            }
            ConfirmKind::RemoveCrop(id) => {
                let outcome = self
                    .portal
                    .remove_crop(&principal, id)
                    .map(|crop| format!("Removed crop {}.", crop.name));
                self.notify(outcome);
                self.state.clamp_list(self.portal.crops().len());
            }
            ConfirmKind::RemoveSubsidy(id) => {
                let outcome = self
                    .portal
                    .remove_subsidy(&principal, id)
                    .map(|subsidy| {
                        format!(
                            "Removed {}. Remaining applications renumbered.",
                            subsidy.description
                        )
                    });
                self.notify(outcome);
                self.state.clamp_list(self.portal.subsidies().len());
            }
        }
    }

    fn decide_application(&mut self, approve: bool) {
        let Some(row) = self.report_rows.get(self.state.list_cursor).cloned() else {
            self.state.set_status("No application selected.".to_string());
            return;
        };
        let Some(principal) = self.session.clone() else {
            return;
        };
        let outcome = if approve {
            self.portal
                .approve(&principal, &row.username, row.subsidy_id)
                .map(|_| format!("Approved subsidy {} for {}.", row.subsidy_id, row.username))
        } else {
            self.portal
                .reject(&principal, &row.username, row.subsidy_id)
                .map(|_| {
                    format!(
                        "Application {} for {} is pending again.",
                        row.subsidy_id, row.username
                    )
                })
        };
        self.notify(outcome);
        self.refresh_report();
    }

    fn refresh_report(&mut self) {
        let Some(principal) = self.session.clone() else {
            self.report_rows.clear();
            return;
        };
        match self.portal.application_report(&principal) {
            Ok(report) => {
                self.report_rows = report
                    .into_iter()
                    .flat_map(|row| {
                        let username = row.username;
                        let full_name = row.full_name;
                        row.entries.into_iter().map(move |entry| ReportRow {
                            username: username.clone(),
                            full_name: full_name.clone(),
                            subsidy_id: entry.subsidy_id,
                            description: entry.description,
                            status: entry.status,
                        })
                    })
                    .collect();
            }
            Err(err) => {
                self.report_rows.clear();
                self.state.set_status(err.to_string());
            }
        }
        self.state.clamp_list(self.report_rows.len());
    }

    fn list_total(&self) -> usize {
        match self.screen {
            Screen::CropPrices | Screen::GrowingSteps | Screen::ManageCrops => {
                self.portal.crops().len()
            }
            Screen::Subsidies | Screen::ManageSubsidies => self.portal.subsidies().len(),
            Screen::FarmerRoster => self
                .session
                .as_ref()
                .and_then(|p| self.portal.farmer_roster(p).ok())
                .map(|roster| roster.len())
                .unwrap_or(0),
            Screen::Applications => self.report_rows.len(),
            _ => 0,
        }
    }

    fn move_list(&mut self, delta: isize) {
        let total = self.list_total();
        self.state.move_list_cursor(delta, total);
    }

    fn status_span(&self, status: ApplicationStatus) -> Span<'static> {
        match status {
            ApplicationStatus::Approved => Span::styled(
                "Approved",
                Style::default()
                    .fg(self.theme.success)
                    .add_modifier(Modifier::BOLD),
            ),
            ApplicationStatus::Pending => {
                Span::styled("Pending", Style::default().fg(self.theme.warning))
            }
        }
    }

    fn draw(&mut self, frame: &mut Frame) {
        match self.screen {
            Screen::Landing => self.draw_landing(frame),
            Screen::FarmerHome => self.draw_home(frame, "Farmer Menu", &FARMER_ITEMS),
            Screen::AdminHome => self.draw_home(frame, "Admin Menu", &ADMIN_ITEMS),
            Screen::LandDetails => self.draw_land_details(frame),
            Screen::CropPrices => self.draw_crop_prices(frame),
            Screen::Subsidies => self.draw_subsidies(frame),
            Screen::MyApplications => self.draw_my_applications(frame),
            Screen::GrowingSteps => self.draw_growing_steps(frame),
            Screen::ManageCrops => self.draw_manage_crops(frame),
            Screen::ManageSubsidies => self.draw_manage_subsidies(frame),
            Screen::FarmerRoster => self.draw_farmer_roster(frame),
            Screen::Applications => self.draw_applications(frame),
        }
        if let Some(form) = self.form.clone() {
            self.render_form(frame, &form);
        }
        if let Some(confirm) = self.confirm.clone() {
            self.render_confirm(frame, &confirm);
        }
    }

    fn draw_landing(&mut self, frame: &mut Frame) {
        let area = frame.size();
        let banner_lines = banner::render("KRISHI");
        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length((banner_lines.len() as u16 + 3).min(area.height)),
                Constraint::Min(3),
                Constraint::Length(3),
            ])
            .split(area);

        let mut content: Vec<Line> = banner_lines
            .into_iter()
            .map(|line| {
                Line::from(Span::styled(
                    line,
                    Style::default()
                        .fg(self.theme.accent)
                        .add_modifier(Modifier::BOLD),
                ))
            })
            .collect();
        content.push(Line::from(""));
        content.push(Line::from(Span::styled(
            "Cooperative Agriculture Portal",
            Style::default().fg(self.theme.muted),
        )));
        frame.render_widget(
            Paragraph::new(content).alignment(Alignment::Center),
            layout[0],
        );

        let menu_width = 30.min(layout[1].width.max(1));
        let menu_height = (LANDING_ITEMS.len() as u16 + 2).min(layout[1].height.max(1));
        let menu_area = centered_rect(menu_width, menu_height, layout[1]);
        let menu_lines = self.menu_lines(&LANDING_ITEMS);
        frame.render_widget(
            Paragraph::new(menu_lines)
                .block(Block::default().borders(Borders::ALL).title("Welcome"))
                .alignment(Alignment::Center),
            menu_area,
        );

        self.render_status(frame, layout[2]);
    }

    fn draw_home(&mut self, frame: &mut Frame, title: &str, items: &[&str]) {
        let (header, body, status) = screen_chunks(frame.size());
        self.render_header(frame, header);

        let menu_width = 34.min(body.width.max(1));
        let menu_height = (items.len() as u16 + 2).min(body.height.max(1));
        let menu_area = centered_rect(menu_width, menu_height, body);
        let menu_lines = self.menu_lines(items);
        frame.render_widget(
            Paragraph::new(menu_lines)
                .block(Block::default().borders(Borders::ALL).title(title.to_string()))
                .alignment(Alignment::Center),
            menu_area,
        );

        self.render_status(frame, status);
    }

    fn menu_lines(&self, items: &[&str]) -> Vec<Line<'static>> {
        items
            .iter()
            .enumerate()
            .map(|(idx, item)| {
                if idx == self.state.menu_cursor {
                    Line::from(Span::styled(
                        format!("▶ {item}"),
                        Style::default()
                            .fg(self.theme.accent)
                            .add_modifier(Modifier::BOLD),
                    ))
                } else {
                    Line::from(Span::styled(
                        format!("  {item}"),
                        Style::default().fg(self.theme.primary_fg),
                    ))
                }
            })
            .collect()
    }

    fn draw_land_details(&mut self, frame: &mut Frame) {
        let (header, body, status) = screen_chunks(frame.size());
        self.render_header(frame, header);

        let block = Block::default()
            .borders(Borders::ALL)
            .title("My Land Details");
        let lines: Vec<Line> = match self
            .session
            .as_ref()
            .map(|principal| self.portal.profile(principal))
        {
            Some(Ok(user)) => {
                let mut lines = vec![
                    Line::from(vec![
                        Span::styled("Name:      ", Style::default().fg(self.theme.muted)),
                        Span::raw(user.full_name.clone()),
                    ]),
                    Line::from(vec![
                        Span::styled("Username:  ", Style::default().fg(self.theme.muted)),
                        Span::raw(user.username.clone()),
                    ]),
                ];
                if user.has_land_details() {
                    lines.push(Line::from(vec![
                        Span::styled("Land size: ", Style::default().fg(self.theme.muted)),
                        Span::raw(format!("{:.1} acres", user.land_size)),
                    ]));
                    lines.push(Line::from(vec![
                        Span::styled("Location:  ", Style::default().fg(self.theme.muted)),
                        Span::raw(user.location.clone()),
                    ]));
                    lines.push(Line::from(vec![
                        Span::styled("Soil type: ", Style::default().fg(self.theme.muted)),
                        Span::raw(user.soil_type.clone()),
                    ]));
                } else {
                    lines.push(Line::from(""));
                    lines.push(Line::from("No land details on file yet."));
                }
                lines.push(Line::from(""));
                lines.push(Line::from(Span::styled(
                    "Press e to update.",
                    Style::default().fg(self.theme.muted),
                )));
                lines
            }
            Some(Err(err)) => vec![Line::from(err.to_string())],
            None => vec![Line::from("Not logged in.")],
        };
        frame.render_widget(
            Paragraph::new(lines).block(block).wrap(Wrap { trim: true }),
            body,
        );

        self.render_status(frame, status);
    }

    fn draw_crop_prices(&mut self, frame: &mut Frame) {
        let (header, body, status) = screen_chunks(frame.size());
        self.render_header(frame, header);

        let block = Block::default()
            .borders(Borders::ALL)
            .title("Crop Prices (per quintal)");
        let mut lines = vec![Line::from(Span::styled(
            format!("{:>3}  {:<20} {:>12}", "Id", "Crop", "Price"),
            Style::default().add_modifier(Modifier::BOLD),
        ))];
        if self.portal.crops().is_empty() {
            lines.push(Line::from("No crops registered yet."));
        }
        for (id, crop) in self.portal.crops().iter() {
            lines.push(Line::from(format!(
                "{:>3}  {:<20} {:>12.2}",
                id, crop.name, crop.price
            )));
        }
        frame.render_widget(
            Paragraph::new(lines).block(block).wrap(Wrap { trim: false }),
            body,
        );

        self.render_status(frame, status);
    }

    fn draw_subsidies(&mut self, frame: &mut Frame) {
        let (header, body, status) = screen_chunks(frame.size());
        self.render_header(frame, header);

        let panes = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
            .split(body);

        let profile = self
            .session
            .as_ref()
            .and_then(|principal| self.portal.users().get(principal.username()));
        let rows: Vec<Line> = self
            .portal
            .subsidies()
            .iter()
            .map(|(id, subsidy)| {
                let mut spans = vec![Span::raw(format!("{id}. {}", subsidy.description))];
                if let Some(status) = profile.and_then(|user| user.application_status(id)) {
                    spans.push(Span::raw("  "));
                    spans.push(self.status_span(status));
                }
                Line::from(spans)
            })
            .collect();
        let total = self.portal.subsidies().len();
        self.render_selectable_list(frame, panes[0], "Subsidies", rows, total);

        let detail_block = Block::default().borders(Borders::ALL).title("Details");
        let detail_lines: Vec<Line> = match self
            .portal
            .subsidies()
            .get(self.state.list_cursor as u32 + 1)
        {
            Ok(subsidy) => vec![
                Line::from(Span::styled(
                    subsidy.description.clone(),
                    Style::default().add_modifier(Modifier::BOLD),
                )),
                Line::from(""),
                Line::from(subsidy.details.clone()),
                Line::from(""),
                Line::from(Span::styled(
                    "Press a to apply.",
                    Style::default().fg(self.theme.muted),
                )),
            ],
            Err(_) => vec![Line::from("No subsidies are listed right now.")],
        };
        frame.render_widget(
            Paragraph::new(detail_lines)
                .block(detail_block)
                .wrap(Wrap { trim: true }),
            panes[1],
        );

        self.render_status(frame, status);
    }

    fn draw_my_applications(&mut self, frame: &mut Frame) {
        let (header, body, status) = screen_chunks(frame.size());
        self.render_header(frame, header);

        let block = Block::default()
            .borders(Borders::ALL)
            .title("My Applications");
        let lines: Vec<Line> = match self
            .session
            .as_ref()
            .map(|principal| self.portal.my_applications(principal))
        {
            Some(Ok(entries)) if entries.is_empty() => {
                vec![Line::from("You have not applied for any subsidies yet.")]
            }
            Some(Ok(entries)) => entries
                .iter()
                .map(|entry| {
                    Line::from(vec![
                        Span::raw(format!("{}. {}  ", entry.subsidy_id, entry.description)),
                        self.status_span(entry.status),
                    ])
                })
                .collect(),
            Some(Err(err)) => vec![Line::from(err.to_string())],
            None => vec![Line::from("Not logged in.")],
        };
        frame.render_widget(
            Paragraph::new(lines).block(block).wrap(Wrap { trim: true }),
            body,
        );

        self.render_status(frame, status);
    }

    fn draw_growing_steps(&mut self, frame: &mut Frame) {
        let (header, body, status) = screen_chunks(frame.size());
        self.render_header(frame, header);

        let panes = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
            .split(body);

        let rows: Vec<Line> = self
            .portal
            .crops()
            .iter()
            .map(|(id, crop)| Line::from(format!("{id}. {}", crop.name)))
            .collect();
        let total = self.portal.crops().len();
        self.render_selectable_list(frame, panes[0], "Crops", rows, total);

        let steps_block = Block::default()
            .borders(Borders::ALL)
            .title("Growing Steps");
        let steps = self
            .portal
            .crops()
            .steps(self.state.list_cursor as u32 + 1)
            .unwrap_or("No crops registered yet.")
            .to_string();
        frame.render_widget(
            Paragraph::new(steps)
                .block(steps_block)
                .wrap(Wrap { trim: true }),
            panes[1],
        );

        self.render_status(frame, status);
    }

    fn draw_manage_crops(&mut self, frame: &mut Frame) {
        let (header, body, status) = screen_chunks(frame.size());
        self.render_header(frame, header);

        let panes = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
            .split(body);

        let rows: Vec<Line> = self
            .portal
            .crops()
            .iter()
            .map(|(id, crop)| {
                Line::from(format!("{:>3}  {:<18} {:>10.2}", id, crop.name, crop.price))
            })
            .collect();
        let total = self.portal.crops().len();
        self.render_selectable_list(frame, panes[0], "Crops", rows, total);

        let detail_block = Block::default().borders(Borders::ALL).title("Crop");
        let detail_lines: Vec<Line> = match self
            .portal
            .crops()
            .get(self.state.list_cursor as u32 + 1)
        {
            Ok(crop) => {
                let steps = self
                    .portal
                    .crops()
                    .steps(self.state.list_cursor as u32 + 1)
                    .unwrap_or_default()
                    .to_string();
                vec![
                    Line::from(Span::styled(
                        crop.name.clone(),
                        Style::default().add_modifier(Modifier::BOLD),
                    )),
                    Line::from(format!("Price: {:.2}", crop.price)),
                    Line::from(""),
                    Line::from(steps),
                ]
            }
            Err(_) => vec![Line::from("The crop catalog is empty.")],
        };
        frame.render_widget(
            Paragraph::new(detail_lines)
                .block(detail_block)
                .wrap(Wrap { trim: true }),
            panes[1],
        );

        self.render_status(frame, status);
    }

    fn draw_manage_subsidies(&mut self, frame: &mut Frame) {
        let (header, body, status) = screen_chunks(frame.size());
        self.render_header(frame, header);

        let panes = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
            .split(body);

        let rows: Vec<Line> = self
            .portal
            .subsidies()
            .iter()
            .map(|(id, subsidy)| Line::from(format!("{id}. {}", subsidy.description)))
            .collect();
        let total = self.portal.subsidies().len();
        self.render_selectable_list(frame, panes[0], "Subsidies", rows, total);

        let detail_block = Block::default().borders(Borders::ALL).title("Subsidy");
        let detail_lines: Vec<Line> = match self
            .portal
            .subsidies()
            .get(self.state.list_cursor as u32 + 1)
        {
            Ok(subsidy) => vec![
                Line::from(Span::styled(
                    subsidy.description.clone(),
                    Style::default().add_modifier(Modifier::BOLD),
                )),
                Line::from(""),
                Line::from(subsidy.details.clone()),
            ],
            Err(_) => vec![Line::from("The subsidy catalog is empty.")],
        };
        frame.render_widget(
            Paragraph::new(detail_lines)
                .block(detail_block)
                .wrap(Wrap { trim: true }),
            panes[1],
        );

        self.render_status(frame, status);
    }

    fn draw_farmer_roster(&mut self, frame: &mut Frame) {
        let (header, body, status) = screen_chunks(frame.size());
        self.render_header(frame, header);

        let rows: Vec<Line> = match self
            .session
            .as_ref()
            .map(|principal| self.portal.farmer_roster(principal))
        {
            Some(Ok(roster)) if roster.is_empty() => {
                vec![Line::from("No farmers have registered yet.")]
            }
            Some(Ok(roster)) => roster
                .iter()
                .map(|user| {
                    let land = if user.has_land_details() {
                        format!("{:.1}", user.land_size)
                    } else {
                        "-".to_string()
                    };
                    let location = if user.location.is_empty() {
                        "-"
                    } else {
                        &user.location
                    };
                    let soil = if user.soil_type.is_empty() {
                        "-"
                    } else {
                        &user.soil_type
                    };
                    Line::from(format!(
                        "{:<14} {:<22} {:>8} {:<14} {:<12}",
                        user.username, user.full_name, land, location, soil
                    ))
                })
                .collect(),
            Some(Err(err)) => vec![Line::from(err.to_string())],
            None => vec![Line::from("Not logged in.")],
        };
        let total = rows.len();
        self.render_selectable_list(
            frame,
            body,
            "Registered Farmers (username / name / acres / location / soil)",
            rows,
            total,
        );

        self.render_status(frame, status);
    }

    fn draw_applications(&mut self, frame: &mut Frame) {
        let (header, body, status) = screen_chunks(frame.size());
        self.render_header(frame, header);

        let rows: Vec<Line> = if self.report_rows.is_empty() {
            vec![Line::from("No subsidy applications on file.")]
        } else {
            self.report_rows
                .iter()
                .map(|row| {
                    Line::from(vec![
                        Span::styled(
                            format!("{:<14}", row.username),
                            Style::default().fg(self.theme.primary_fg),
                        ),
                        Span::styled(
                            format!("{:<20}", row.full_name),
                            Style::default().fg(self.theme.muted),
                        ),
                        Span::raw(format!("{:>3}  {:<38}", row.subsidy_id, row.description)),
                        self.status_span(row.status),
                    ])
                })
                .collect()
        };
        let total = self.report_rows.len().max(1);
        self.render_selectable_list(frame, body, "Subsidy Applications", rows, total);

        self.render_status(frame, status);
    }

    fn render_selectable_list(
        &mut self,
        frame: &mut Frame,
        area: Rect,
        title: &str,
        rows: Vec<Line<'static>>,
        total: usize,
    ) {
        self.state.list_height = area.height.saturating_sub(2) as usize;
        self.state.clamp_list(total);
        self.state.ensure_list_visible(total);

        let end = cmp::min(rows.len(), self.state.list_offset + self.state.list_height.max(1));
        let offset = cmp::min(self.state.list_offset, rows.len());
        let items: Vec<ListItem> = rows[offset..end]
            .iter()
            .enumerate()
            .map(|(idx, line)| {
                let absolute = offset + idx;
                let marker = if absolute == self.state.list_cursor {
                    Span::styled(
                        "▶ ",
                        Style::default()
                            .fg(self.theme.accent)
                            .add_modifier(Modifier::BOLD),
                    )
                } else {
                    Span::raw("  ")
                };
                let mut spans = vec![marker];
                spans.extend(line.spans.iter().cloned());
                ListItem::new(Line::from(spans))
            })
            .collect();

        let mut list_state = ListState::default();
        if !items.is_empty() {
            let selected = self
                .state
                .list_cursor
                .saturating_sub(offset)
                .min(items.len() - 1);
            list_state.select(Some(selected));
        }

        let list = List::new(items)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(title.to_string()),
            )
            .highlight_style(Style::default().bg(self.theme.selection_bg));
        frame.render_stateful_widget(list, area, &mut list_state);
    }

    fn render_header(&self, frame: &mut Frame, area: Rect) {
        let identity = match self.session.as_ref() {
            Some(principal) if principal.is_admin() => {
                format!("{} (admin)", principal.username())
            }
            Some(principal) => principal.username().to_string(),
            None => "not logged in".to_string(),
        };
        let clock = Local::now().format("%Y-%m-%d %H:%M");
        let line = Line::from(vec![
            Span::styled(
                "Krishi",
                Style::default()
                    .fg(self.theme.accent)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::raw("  "),
            Span::styled(
                format!("{identity}  ·  {clock}"),
                Style::default().fg(self.theme.muted),
            ),
        ]);
        frame.render_widget(Paragraph::new(line), area);
    }

    fn render_status(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default().borders(Borders::ALL).title("Status");
        let primary = self.state.status.clone();
        let secondary = self.key_hints();
        let paragraph = Paragraph::new(vec![
            Line::from(primary),
            Line::from(Span::styled(
                secondary,
                Style::default().fg(self.theme.muted),
            )),
        ])
        .block(block)
        .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, area);
    }

    fn key_hints(&self) -> String {
        let hints = match self.screen {
            Screen::Landing => "j/k move  Enter select  q quit",
            Screen::FarmerHome | Screen::AdminHome => "j/k move  Enter select  Esc log out  q quit",
            Screen::LandDetails => "e edit  Esc back",
            Screen::CropPrices | Screen::MyApplications => "Esc back",
            Screen::GrowingSteps | Screen::FarmerRoster => "j/k move  Esc back",
            Screen::Subsidies => "j/k move  a apply  Esc back",
            Screen::ManageCrops => "j/k move  a add  u update price  d remove  Esc back",
            Screen::ManageSubsidies => "j/k move  a add  u update  d remove  Esc back",
            Screen::Applications => "j/k move  a approve  r reject  Esc back",
        };
        hints.to_string()
    }

    fn render_form(&self, frame: &mut Frame, form: &FormModal) {
        let frame_area = frame.size();
        let mut width = cmp::min(56_u16, frame_area.width.saturating_sub(4));
        width = cmp::max(width, 30_u16);
        let height = (form.fields.len() as u16 + 4)
            .min(frame_area.height.saturating_sub(2))
            .max(5);
        let area = centered_rect(width, height, frame_area);

        frame.render_widget(Clear, area);

        let mut lines = Vec::new();
        for (idx, field) in form.fields.iter().enumerate() {
            let marker = if idx == form.focus {
                Span::styled("> ", Style::default().fg(self.theme.accent))
            } else {
                Span::raw("  ")
            };
            lines.push(Line::from(vec![
                marker,
                Span::styled(
                    format!("{:<width$}", format!("{}:", field.label), width = LABEL_WIDTH),
                    Style::default().fg(self.theme.muted),
                ),
                Span::raw(field.display()),
            ]));
        }
        lines.push(Line::from(""));
        lines.push(Line::from(vec![
            Span::styled("Enter", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(" next/submit  "),
            Span::styled("Tab", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(" switch  "),
            Span::styled("Esc", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(" cancel"),
        ]));

        let paragraph = Paragraph::new(lines)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(form.title.clone()),
            )
            .wrap(Wrap { trim: false });
        frame.render_widget(paragraph, area);

        let focused = &form.fields[form.focus];
        let cursor_x = (area.x + 1 + 2 + LABEL_WIDTH as u16 + focused.cursor as u16)
            .min(area.x + area.width.saturating_sub(2));
        let cursor_y = area.y + 1 + form.focus as u16;
        frame.set_cursor(cursor_x, cursor_y);
    }

    fn render_confirm(&self, frame: &mut Frame, confirm: &ConfirmModal) {
        let frame_area = frame.size();
        let width = cmp::min(58_u16, frame_area.width.saturating_sub(4)).max(24);
        let height = 6_u16.min(frame_area.height.saturating_sub(2)).max(5);
        let area = centered_rect(width, height, frame_area);

        frame.render_widget(Clear, area);

        let border_color = match confirm.kind {
            ConfirmKind::ApplySubsidy(_) => self.theme.accent,
            ConfirmKind::RemoveCrop(_) | ConfirmKind::RemoveSubsidy(_) => self.theme.danger,
        };
        let helper = Line::from(vec![
            Span::styled("y", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(" confirm  "),
            Span::styled("n", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(" cancel"),
        ]);
        let paragraph = Paragraph::new(vec![
            Line::from(confirm.message.clone()),
            Line::from(""),
            helper,
        ])
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("Confirm")
                .border_style(Style::default().fg(border_color)),
        )
        .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, area);
    }
}

fn screen_chunks(area: Rect) -> (Rect, Rect, Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(5),
            Constraint::Length(3),
        ])
        .split(area);
    (chunks[0], chunks[1], chunks[2])
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
    disable_raw_mode().context("failed to disable raw mode")?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)
        .context("failed to leave alternate screen")?;
    terminal.show_cursor()?;
    Ok(())
}

fn spawn_input_thread(sender: mpsc::Sender<AppEvent>) {
    thread::spawn(move || loop {
        match event::poll(TICK_RATE) {
            Ok(true) => match event::read() {
                Ok(evt) => {
                    if sender.send(AppEvent::Input(evt)).is_err() {
                        break;
                    }
                }
                Err(_) => break,
            },
            Ok(false) => {
                if sender.send(AppEvent::Tick).is_err() {
                    break;
                }
            }
            Err(_) => break,
        }
    });
}

fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width, height)
}
