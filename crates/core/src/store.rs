//! Flat-file persistence for the account set.
//!
//! One record per line, nine pipe-separated fields:
//!
//! ```text
//! username|password|full_name|is_admin|land_size|location|soil_type|applications|approved
//! ```
//!
//! The two trailing fields are comma-joined 1-based subsidy positions.
//! Records written by older tools may stop after the fourth field; readers
//! tolerate that and fill in defaults, while the writer always emits all
//! nine fields.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::error::Error;
use crate::models::User;

const FIELD_SEPARATOR: char = '|';
const LIST_SEPARATOR: char = ',';
// username, password, full name and the admin flag; anything shorter
// cannot identify an account
const MIN_FIELDS: usize = 4;

/// Reads and writes the account records at a fixed path.
#[derive(Debug, Clone)]
pub struct UserStore {
    path: PathBuf,
}

impl UserStore {
    /// Store rooted at `path`. Nothing is touched until load or save.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the full account set. A missing file is a normal first start
    /// and yields an empty set; an unreadable or malformed file fails the
    /// whole load so a truncated save is never silently half-applied.
    pub fn load(&self) -> Result<BTreeMap<String, User>> {
        if !self.path.exists() {
            info!(path = %self.path.display(), "no account data yet, starting empty");
            return Ok(BTreeMap::new());
        }
        let content = fs::read_to_string(&self.path)
            .with_context(|| format!("failed to read {}", self.path.display()))?;
        let mut users = BTreeMap::new();
        for (index, line) in content.lines().enumerate() {
            if let Some(user) = parse_record(line, index + 1)? {
                users.insert(user.username.clone(), user);
            }
        }
        info!(count = users.len(), path = %self.path.display(), "account data loaded");
        Ok(users)
    }

    /// Write the full account set, replacing whatever was on disk. The data
    /// goes to a sibling temp file first so an interrupted write cannot
    /// truncate the previous records.
    pub fn save(&self, users: &BTreeMap<String, User>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("failed to create {}", parent.display()))?;
            }
        }
        let mut out = String::new();
        for user in users.values() {
            out.push_str(&render_record(user));
            out.push('\n');
        }
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, out).with_context(|| format!("failed to write {}", tmp.display()))?;
        fs::rename(&tmp, &self.path)
            .with_context(|| format!("failed to replace {}", self.path.display()))?;
        info!(count = users.len(), path = %self.path.display(), "account data saved");
        Ok(())
    }
}

/// Parse one line. `Ok(None)` means the line was skipped (blank, or too
/// short to identify an account); a present but unparseable numeric field
/// is an error that aborts the load.
fn parse_record(line: &str, line_no: usize) -> Result<Option<User>, Error> {
    if line.trim().is_empty() {
        return Ok(None);
    }
    let fields: Vec<&str> = line.split(FIELD_SEPARATOR).map(str::trim).collect();
    if fields.len() < MIN_FIELDS {
        warn!(line = line_no, fields = fields.len(), "skipping short record");
        return Ok(None);
    }
    let mut user = User::new(
        fields[0],
        fields[1],
        fields[2],
        fields[3].eq_ignore_ascii_case("true"),
    );
    if let Some(raw) = fields.get(4).filter(|raw| !raw.is_empty()) {
        user.land_size = raw.parse::<f64>().map_err(|err| Error::MalformedRecord {
            line: line_no,
            reason: format!("land size {raw:?}: {err}"),
        })?;
    }
    if let Some(raw) = fields.get(5) {
        user.location = (*raw).to_string();
    }
    if let Some(raw) = fields.get(6) {
        user.soil_type = (*raw).to_string();
    }
    if let Some(raw) = fields.get(7) {
        user.subsidy_applications = parse_id_list(raw, line_no, "application")?;
    }
    if let Some(raw) = fields.get(8) {
        user.approved_subsidies = parse_id_list(raw, line_no, "approval")?;
    }
    Ok(Some(user))
}

fn parse_id_list(field: &str, line_no: usize, what: &str) -> Result<Vec<u32>, Error> {
    if field.is_empty() {
        return Ok(Vec::new());
    }
    field
        .split(LIST_SEPARATOR)
        .map(|raw| {
            let raw = raw.trim();
            raw.parse::<u32>().map_err(|err| Error::MalformedRecord {
                line: line_no,
                reason: format!("{what} id {raw:?}: {err}"),
            })
        })
        .collect()
}

fn render_record(user: &User) -> String {
    format!(
        "{}|{}|{}|{}|{}|{}|{}|{}|{}",
        user.username,
        user.password,
        user.full_name,
        user.is_admin,
        user.land_size,
        user.location,
        user.soil_type,
        join_ids(&user.subsidy_applications),
        join_ids(&user.approved_subsidies),
    )
}

fn join_ids(ids: &[u32]) -> String {
    ids.iter()
        .map(u32::to_string)
        .collect::<Vec<_>>()
        .join(",")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::UserDirectory;
    use tempfile::tempdir;

    fn sample_users() -> BTreeMap<String, User> {
        let mut ravi = User::new("ravi", "secret", "Ravi Kumar", false);
        ravi.set_land_details(12.5, "Nashik".to_string(), "Black".to_string());
        ravi.subsidy_applications = vec![2, 3];
        ravi.approved_subsidies = vec![3];
        let admin = User::new("admin", "admin123", "Administrator", true);
        let mut users = BTreeMap::new();
        users.insert(ravi.username.clone(), ravi);
        users.insert(admin.username.clone(), admin);
        users
    }

    #[test]
    fn save_then_load_round_trips() -> Result<()> {
        let dir = tempdir()?;
        let store = UserStore::new(dir.path().join("user.txt"));
        let users = sample_users();
        store.save(&users)?;
        let loaded = store.load()?;
        assert_eq!(loaded, users);
        Ok(())
    }

    #[test]
    fn registered_credentials_survive_a_reload() -> Result<()> {
        let dir = tempdir()?;
        let store = UserStore::new(dir.path().join("user.txt"));
        let mut directory = UserDirectory::new();
        directory.register("meena", "gate pass", "Meena Patil")?;
        // padded passwords would come back trimmed, so registration refuses them
        assert!(directory.register("padded", " secret", "Padded Password").is_err());
        store.save(directory.users())?;
        let reloaded = UserDirectory::from_users(store.load()?);
        assert!(reloaded.login("meena", "gate pass").is_ok());
        Ok(())
    }

    #[test]
    fn missing_file_loads_empty() {
        let dir = tempdir().unwrap();
        let store = UserStore::new(dir.path().join("user.txt"));
        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn save_creates_missing_parent_directories() {
        let dir = tempdir().unwrap();
        let store = UserStore::new(dir.path().join("nested/data/user.txt"));
        store.save(&sample_users()).unwrap();
        assert_eq!(store.load().unwrap().len(), 2);
    }

    #[test]
    fn every_record_is_written_with_nine_fields() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("user.txt");
        let store = UserStore::new(&path);
        store.save(&sample_users())?;
        let content = fs::read_to_string(&path)?;
        for line in content.lines() {
            assert_eq!(line.split('|').count(), 9, "line {line:?}");
        }
        assert!(content.contains("ravi|secret|Ravi Kumar|false|12.5|Nashik|Black|2,3|3"));
        assert!(content.contains("admin|admin123|Administrator|true|0||||"));
        Ok(())
    }

    #[test]
    fn legacy_four_field_record_gets_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("user.txt");
        fs::write(&path, "ravi|secret|Ravi Kumar|false\n").unwrap();
        let users = UserStore::new(&path).load().unwrap();
        let ravi = &users["ravi"];
        assert_eq!(ravi.land_size, 0.0);
        assert!(ravi.location.is_empty());
        assert!(ravi.subsidy_applications.is_empty());
        assert!(ravi.approved_subsidies.is_empty());
    }

    #[test]
    fn empty_optional_fields_mean_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("user.txt");
        fs::write(&path, "ravi|secret|Ravi Kumar|false|||||\n").unwrap();
        let users = UserStore::new(&path).load().unwrap();
        let ravi = &users["ravi"];
        assert_eq!(ravi.land_size, 0.0);
        assert!(ravi.subsidy_applications.is_empty());
    }

    #[test]
    fn short_and_blank_lines_are_skipped() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("user.txt");
        fs::write(
            &path,
            "ravi|secret|Ravi Kumar|false\n\nbroken|only-two\nadmin|admin123|Administrator|true\n",
        )
        .unwrap();
        let users = UserStore::new(&path).load().unwrap();
        assert_eq!(users.len(), 2);
        assert!(users.contains_key("ravi"));
        assert!(users.contains_key("admin"));
    }

    #[test]
    fn surrounding_whitespace_is_trimmed() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("user.txt");
        fs::write(&path, " ravi | secret | Ravi Kumar | TRUE | 3.5 | Pune | Red | 1, 2 | 2 \n")
            .unwrap();
        let users = UserStore::new(&path).load().unwrap();
        let ravi = &users["ravi"];
        assert_eq!(ravi.username, "ravi");
        assert!(ravi.is_admin);
        assert_eq!(ravi.land_size, 3.5);
        assert_eq!(ravi.subsidy_applications, vec![1, 2]);
        assert_eq!(ravi.approved_subsidies, vec![2]);
    }

    #[test]
    fn admin_flag_is_true_only_for_literal_true() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("user.txt");
        fs::write(&path, "a|p|A|True\nb|p|B|yes\nc|p|C|1\n").unwrap();
        let users = UserStore::new(&path).load().unwrap();
        assert!(users["a"].is_admin);
        assert!(!users["b"].is_admin);
        assert!(!users["c"].is_admin);
    }

    #[test]
    fn unparseable_land_size_fails_the_whole_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("user.txt");
        fs::write(
            &path,
            "good|pw|Good|false|1.0|||1|\nbad|pw|Bad|false|plenty|||1|\n",
        )
        .unwrap();
        let err = UserStore::new(&path).load().unwrap_err();
        assert!(err.to_string().contains("line 2"));
    }

    #[test]
    fn unparseable_list_entry_fails_the_whole_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("user.txt");
        fs::write(&path, "ravi|pw|Ravi|false|1.0|Pune|Red|1,two|\n").unwrap();
        assert!(UserStore::new(&path).load().is_err());
    }

    #[test]
    fn save_replaces_previous_contents() {
        let dir = tempdir().unwrap();
        let store = UserStore::new(dir.path().join("user.txt"));
        store.save(&sample_users()).unwrap();
        let mut smaller = BTreeMap::new();
        smaller.insert(
            "solo".to_string(),
            User::new("solo", "pw", "Solo Farmer", false),
        );
        store.save(&smaller).unwrap();
        let loaded = store.load().unwrap();
        assert_eq!(loaded.len(), 1);
        assert!(loaded.contains_key("solo"));
    }
}
