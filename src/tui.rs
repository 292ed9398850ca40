//! Terminal editor surface built on ratatui.
//!
//! Left pane: species list with incremental search. Right pane: the
//! selected document flattened into a navigable list of fields bound to
//! the shared form model. Text fields are edited through an input buffer
//! (Enter to edit, Enter to confirm, Esc to cancel); enum fields cycle
//! with the arrow keys; list rows are added and deleted through action
//! rows. Seeding runs on a worker thread while the event loop keeps
//! polling, so the interface stays responsive.

use std::error::Error;
use std::io::stdout;
use std::sync::mpsc::{self, Receiver};
use std::thread;
use std::time::Duration;

use crossterm::{
    event::{self, Event, KeyCode},
    execute,
    terminal::{self, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Clear, Paragraph},
};

use crate::error::SeedError;
use crate::forms::{ConditionForm, DocumentForm};
use crate::schema::{
    Bucket, MoonPhase, PositionType, SpawnType, TimeRange, CONDITION_BOOL_FIELDS,
    CONDITION_INT_FIELDS, CONDITION_LIST_FIELDS, CONDITION_STRING_FIELDS,
};
use crate::seeder::{SeedProgress, SeedReport, Seeder};
use crate::store::{SpawnFileStore, SpeciesFile};

/// Which condition block a field belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum CondTarget {
    Condition,
    Anticondition,
    Multiplier(usize),
}

/// Addressable location in the document form. Rebuilt every frame from
/// the form, so indices always match the current row layout.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum FieldRef {
    Enabled,
    InstalledMods,
    UninstalledMods,
    SpawnId(usize),
    SpawnType(usize),
    SpawnPokemon(usize),
    SpawnPresets(usize),
    SpawnPosition(usize),
    SpawnBucket(usize),
    SpawnLevel(usize),
    SpawnWeight(usize),
    HerdSize(usize),
    HerdDistance(usize),
    MemberPokemon(usize, usize),
    MemberLevelRange(usize, usize),
    MemberWeight(usize, usize),
    MemberLeader(usize, usize),
    MemberMaxTimes(usize, usize),
    MemberOffset(usize, usize),
    DeleteMember(usize, usize),
    AddMember(usize),
    MultiplierValue(usize, usize),
    DeleteMultiplier(usize, usize),
    AddMultiplier(usize),
    CondTime(usize, CondTarget),
    CondMoon(usize, CondTarget),
    CondFlag(usize, CondTarget, usize),
    CondInt(usize, CondTarget, usize),
    CondList(usize, CondTarget, usize),
    CondString(usize, CondTarget, usize),
    DropsEnabled(usize),
    DropsAmount(usize),
    DropItem(usize, usize),
    DropQty(usize, usize),
    DropPct(usize, usize),
    DeleteDropEntry(usize, usize),
    AddDropEntry(usize),
    DeleteSpawn(usize),
    AddSpawn,
    Save,
}

/// One rendered row of the form pane.
struct FormRow {
    slot: Option<FieldRef>,
    indent: u16,
    label: String,
    value: String,
    header: bool,
}

impl FormRow {
    fn header(label: impl Into<String>) -> FormRow {
        FormRow {
            slot: None,
            indent: 0,
            label: label.into(),
            value: String::new(),
            header: true,
        }
    }

    fn field(slot: FieldRef, indent: u16, label: impl Into<String>, value: String) -> FormRow {
        FormRow {
            slot: Some(slot),
            indent,
            label: label.into(),
            value,
            header: false,
        }
    }

    fn action(slot: FieldRef, indent: u16, label: impl Into<String>) -> FormRow {
        FormRow {
            slot: Some(slot),
            indent,
            label: label.into(),
            value: String::new(),
            header: false,
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Pane {
    List,
    Form,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum ConfirmAction {
    Reset,
    Blank,
}

enum SeedJob {
    Ensure,
    Reset,
}

enum SeedEvent {
    Progress(SeedProgress),
    Finished(Result<SeedReport, SeedError>),
}

struct TuiApp {
    store: SpawnFileStore,
    files: Vec<SpeciesFile>,
    search: String,
    searching: bool,
    list_index: usize,
    pane: Pane,
    form: Option<DocumentForm>,
    selected_row: usize,
    editing: bool,
    input_buffer: String,
    status: String,
    confirm: Option<ConfirmAction>,
    seed_rx: Option<Receiver<SeedEvent>>,
    seed_label: String,
    quit: bool,
}

impl TuiApp {
    fn new(store: SpawnFileStore) -> TuiApp {
        let mut app = TuiApp {
            store,
            files: Vec::new(),
            search: String::new(),
            searching: false,
            list_index: 0,
            pane: Pane::List,
            form: None,
            selected_row: 0,
            editing: false,
            input_buffer: String::new(),
            status: String::new(),
            confirm: None,
            seed_rx: None,
            seed_label: String::new(),
            quit: false,
        };
        if app.store.is_populated() {
            app.files = app.store.list_files();
        } else {
            app.start_seed(SeedJob::Ensure);
        }
        app
    }

    fn filtered_files(&self) -> Vec<&SpeciesFile> {
        let search = self.search.to_lowercase();
        self.files
            .iter()
            .filter(|f| {
                search.is_empty()
                    || f.display_name().to_lowercase().contains(&search)
                    || f.file_name.to_lowercase().contains(&search)
            })
            .collect()
    }

    fn start_seed(&mut self, job: SeedJob) {
        let (tx, rx) = mpsc::channel();
        self.seed_rx = Some(rx);
        self.seed_label = "Downloading spawn data...".to_string();
        self.form = None;
        let seeder = Seeder::new(self.store.dir());
        thread::spawn(move || {
            let mut report = |p: SeedProgress| {
                let _ = tx.send(SeedEvent::Progress(p));
            };
            let result = match job {
                SeedJob::Ensure => seeder.ensure_seeded(&mut report),
                SeedJob::Reset => seeder.reset_all(&mut report),
            };
            let _ = tx.send(SeedEvent::Finished(result));
        });
    }

    fn poll_seed(&mut self) {
        let mut finished = None;
        if let Some(rx) = &self.seed_rx {
            while let Ok(event) = rx.try_recv() {
                match event {
                    SeedEvent::Progress(p) => self.seed_label = p.to_string(),
                    SeedEvent::Finished(result) => finished = Some(result),
                }
            }
        }
        if let Some(result) = finished {
            self.seed_rx = None;
            match result {
                Ok(report) => {
                    self.status = format!(
                        "Seeded: {} downloaded, {} blank(s), {} file(s) total",
                        report.spawn_files_written, report.blanks_created, report.total_files
                    );
                }
                Err(e) => self.status = format!("Seeding failed: {}", e),
            }
            self.files = self.store.list_files();
            self.list_index = 0;
        }
    }

    fn open_selected(&mut self) {
        let Some(file) = self.filtered_files().get(self.list_index).cloned().cloned() else {
            return;
        };
        match self.store.load(&file) {
            Ok(pool) => {
                self.form = Some(DocumentForm::from_pool(file, &pool));
                self.selected_row = 0;
                self.pane = Pane::Form;
                self.status.clear();
            }
            Err(e) => self.status = e.to_string(),
        }
    }

    fn save_current(&mut self) {
        if let Some(form) = &self.form {
            let pool = form.commit();
            match self.store.save(&form.file, &pool) {
                Ok(()) => self.status = format!("Saved {}", form.file.file_name),
                Err(e) => self.status = e.to_string(),
            }
        }
    }

    // ------------------------------------------------------------------
    // Form row construction
    // ------------------------------------------------------------------

    fn build_rows(&self) -> Vec<FormRow> {
        let Some(form) = &self.form else {
            return Vec::new();
        };
        let mut rows = Vec::new();
        rows.push(FormRow::field(
            FieldRef::Enabled,
            0,
            "Enabled",
            checkbox(form.enabled),
        ));
        rows.push(FormRow::field(
            FieldRef::InstalledMods,
            0,
            "Needed installed mods",
            form.installed_mods.clone(),
        ));
        rows.push(FormRow::field(
            FieldRef::UninstalledMods,
            0,
            "Needed uninstalled mods",
            form.uninstalled_mods.clone(),
        ));

        for (s, spawn) in form.spawns.iter().enumerate() {
            rows.push(FormRow::header(format!(
                "Spawn: {}",
                if spawn.id.is_empty() { "(unnamed)" } else { spawn.id.as_str() }
            )));
            rows.push(FormRow::field(FieldRef::SpawnId(s), 1, "ID", spawn.id.clone()));
            rows.push(FormRow::field(
                FieldRef::SpawnType(s),
                1,
                "Type",
                format!("< {} >", spawn.spawn_type.as_str()),
            ));
            if !spawn.spawn_type.is_herd() {
                rows.push(FormRow::field(
                    FieldRef::SpawnPokemon(s),
                    1,
                    "Pokemon",
                    spawn.pokemon.clone(),
                ));
            }
            rows.push(FormRow::field(
                FieldRef::SpawnPresets(s),
                1,
                "Presets",
                if spawn.presets.is_empty() {
                    "(none)".to_string()
                } else {
                    spawn.presets.join(", ")
                },
            ));
            rows.push(FormRow::field(
                FieldRef::SpawnPosition(s),
                1,
                "Position",
                format!("< {} >", spawn.position.as_str()),
            ));
            rows.push(FormRow::field(
                FieldRef::SpawnBucket(s),
                1,
                "Bucket",
                format!("< {} >", spawn.bucket.as_str()),
            ));
            rows.push(FormRow::field(
                FieldRef::SpawnLevel(s),
                1,
                "Level range",
                spawn.level.clone(),
            ));
            rows.push(FormRow::field(
                FieldRef::SpawnWeight(s),
                1,
                "Weight",
                spawn.weight.clone(),
            ));

            if spawn.spawn_type.is_herd() {
                rows.push(FormRow::header("  Herd settings"));
                rows.push(FormRow::field(
                    FieldRef::HerdSize(s),
                    2,
                    "Max herd size",
                    spawn.max_herd_size.clone(),
                ));
                rows.push(FormRow::field(
                    FieldRef::HerdDistance(s),
                    2,
                    "Min distance",
                    spawn.min_herd_distance.clone(),
                ));
                for (m, member) in spawn.herd_members.iter().enumerate() {
                    rows.push(FormRow::header(format!("  Herd member {}", m + 1)));
                    rows.push(FormRow::field(
                        FieldRef::MemberPokemon(s, m),
                        2,
                        "Pokemon",
                        member.pokemon.clone(),
                    ));
                    rows.push(FormRow::field(
                        FieldRef::MemberLevelRange(s, m),
                        2,
                        "Level range",
                        member.level_range.clone(),
                    ));
                    rows.push(FormRow::field(
                        FieldRef::MemberWeight(s, m),
                        2,
                        "Weight",
                        member.weight.clone(),
                    ));
                    rows.push(FormRow::field(
                        FieldRef::MemberLeader(s, m),
                        2,
                        "Is leader",
                        checkbox(member.is_leader),
                    ));
                    rows.push(FormRow::field(
                        FieldRef::MemberMaxTimes(s, m),
                        2,
                        "Max times (0 = unlimited)",
                        member.max_times.clone(),
                    ));
                    rows.push(FormRow::field(
                        FieldRef::MemberOffset(s, m),
                        2,
                        "Level range offset",
                        member.level_range_offset.clone(),
                    ));
                    rows.push(FormRow::action(
                        FieldRef::DeleteMember(s, m),
                        2,
                        "[ Delete herd member ]",
                    ));
                }
                rows.push(FormRow::action(
                    FieldRef::AddMember(s),
                    2,
                    "[ Add herd member ]",
                ));
            }

            rows.push(FormRow::header("  Weight multipliers"));
            for (w, wm) in spawn.multipliers.iter().enumerate() {
                rows.push(FormRow::field(
                    FieldRef::MultiplierValue(s, w),
                    2,
                    format!("Multiplier {}", w + 1),
                    wm.multiplier.clone(),
                ));
                self.push_condition_rows(
                    &mut rows,
                    s,
                    CondTarget::Multiplier(w),
                    &wm.condition,
                );
                rows.push(FormRow::action(
                    FieldRef::DeleteMultiplier(s, w),
                    2,
                    "[ Delete multiplier ]",
                ));
            }
            rows.push(FormRow::action(
                FieldRef::AddMultiplier(s),
                2,
                "[ Add multiplier ]",
            ));

            rows.push(FormRow::header("  Condition"));
            self.push_condition_rows(&mut rows, s, CondTarget::Condition, &spawn.condition);
            rows.push(FormRow::header("  Anticondition"));
            self.push_condition_rows(&mut rows, s, CondTarget::Anticondition, &spawn.anticondition);

            rows.push(FormRow::header("  Drops"));
            rows.push(FormRow::field(
                FieldRef::DropsEnabled(s),
                2,
                "Enable drops",
                checkbox(spawn.drops.enabled),
            ));
            if spawn.drops.enabled {
                rows.push(FormRow::field(
                    FieldRef::DropsAmount(s),
                    2,
                    "Drop amount",
                    spawn.drops.amount.clone(),
                ));
                for (d, entry) in spawn.drops.entries.iter().enumerate() {
                    rows.push(FormRow::field(
                        FieldRef::DropItem(s, d),
                        2,
                        format!("Item {}", d + 1),
                        entry.item.clone(),
                    ));
                    rows.push(FormRow::field(
                        FieldRef::DropQty(s, d),
                        2,
                        "Qty range",
                        entry.quantity_range.clone(),
                    ));
                    rows.push(FormRow::field(
                        FieldRef::DropPct(s, d),
                        2,
                        "% chance",
                        entry.percentage.clone(),
                    ));
                    rows.push(FormRow::action(
                        FieldRef::DeleteDropEntry(s, d),
                        2,
                        "[ Delete drop entry ]",
                    ));
                }
                rows.push(FormRow::action(
                    FieldRef::AddDropEntry(s),
                    2,
                    "[ Add drop entry ]",
                ));
            }

            rows.push(FormRow::action(
                FieldRef::DeleteSpawn(s),
                1,
                "[ Delete this spawn ]",
            ));
        }

        rows.push(FormRow::action(FieldRef::AddSpawn, 0, "[ Add new spawn ]"));
        rows.push(FormRow::action(FieldRef::Save, 0, "[ Save ]"));
        rows
    }

    fn push_condition_rows(
        &self,
        rows: &mut Vec<FormRow>,
        s: usize,
        target: CondTarget,
        cond: &ConditionForm,
    ) {
        rows.push(FormRow::field(
            FieldRef::CondTime(s, target),
            3,
            "Time range",
            format!("< {} >", cond.time_range.label()),
        ));
        rows.push(FormRow::field(
            FieldRef::CondMoon(s, target),
            3,
            "Moon phase",
            format!("< {} >", cond.moon_phase.label()),
        ));
        for (i, field) in CONDITION_BOOL_FIELDS.iter().enumerate() {
            rows.push(FormRow::field(
                FieldRef::CondFlag(s, target, i),
                3,
                *field,
                checkbox(cond.flags[i]),
            ));
        }
        for (i, field) in CONDITION_INT_FIELDS.iter().enumerate() {
            rows.push(FormRow::field(
                FieldRef::CondInt(s, target, i),
                3,
                *field,
                cond.ints[i].text.clone(),
            ));
        }
        for (i, field) in CONDITION_LIST_FIELDS.iter().enumerate() {
            rows.push(FormRow::field(
                FieldRef::CondList(s, target, i),
                3,
                format!("{} (comma-separated)", field),
                cond.lists[i].lines().collect::<Vec<_>>().join(", "),
            ));
        }
        for (i, field) in CONDITION_STRING_FIELDS.iter().enumerate() {
            rows.push(FormRow::field(
                FieldRef::CondString(s, target, i),
                3,
                *field,
                cond.strings[i].clone(),
            ));
        }
    }

    // ------------------------------------------------------------------
    // Field access
    // ------------------------------------------------------------------

    /// Initial edit buffer for a text field; None for toggles, cycles and
    /// actions.
    fn edit_buffer(&self, slot: FieldRef) -> Option<String> {
        let form = self.form.as_ref()?;
        let spawn = |s: usize| form.spawns.get(s);
        match slot {
            FieldRef::InstalledMods => Some(form.installed_mods.clone()),
            FieldRef::UninstalledMods => Some(form.uninstalled_mods.clone()),
            FieldRef::SpawnId(s) => spawn(s).map(|sp| sp.id.clone()),
            FieldRef::SpawnPokemon(s) => spawn(s).map(|sp| sp.pokemon.clone()),
            FieldRef::SpawnPresets(s) => spawn(s).map(|sp| sp.presets.join(", ")),
            FieldRef::SpawnLevel(s) => spawn(s).map(|sp| sp.level.clone()),
            FieldRef::SpawnWeight(s) => spawn(s).map(|sp| sp.weight.clone()),
            FieldRef::HerdSize(s) => spawn(s).map(|sp| sp.max_herd_size.clone()),
            FieldRef::HerdDistance(s) => spawn(s).map(|sp| sp.min_herd_distance.clone()),
            FieldRef::MemberPokemon(s, m) => {
                spawn(s).and_then(|sp| sp.herd_members.get(m)).map(|hm| hm.pokemon.clone())
            }
            FieldRef::MemberLevelRange(s, m) => spawn(s)
                .and_then(|sp| sp.herd_members.get(m))
                .map(|hm| hm.level_range.clone()),
            FieldRef::MemberWeight(s, m) => spawn(s)
                .and_then(|sp| sp.herd_members.get(m))
                .map(|hm| hm.weight.clone()),
            FieldRef::MemberMaxTimes(s, m) => spawn(s)
                .and_then(|sp| sp.herd_members.get(m))
                .map(|hm| hm.max_times.clone()),
            FieldRef::MemberOffset(s, m) => spawn(s)
                .and_then(|sp| sp.herd_members.get(m))
                .map(|hm| hm.level_range_offset.clone()),
            FieldRef::MultiplierValue(s, w) => spawn(s)
                .and_then(|sp| sp.multipliers.get(w))
                .map(|wm| wm.multiplier.clone()),
            FieldRef::CondInt(s, target, i) => spawn(s)
                .and_then(|sp| cond_of(sp, target))
                .map(|c| c.ints[i].text.clone()),
            FieldRef::CondList(s, target, i) => spawn(s)
                .and_then(|sp| cond_of(sp, target))
                .map(|c| c.lists[i].lines().collect::<Vec<_>>().join(", ")),
            FieldRef::CondString(s, target, i) => spawn(s)
                .and_then(|sp| cond_of(sp, target))
                .map(|c| c.strings[i].clone()),
            FieldRef::DropsAmount(s) => spawn(s).map(|sp| sp.drops.amount.clone()),
            FieldRef::DropItem(s, d) => spawn(s)
                .and_then(|sp| sp.drops.entries.get(d))
                .map(|e| e.item.clone()),
            FieldRef::DropQty(s, d) => spawn(s)
                .and_then(|sp| sp.drops.entries.get(d))
                .map(|e| e.quantity_range.clone()),
            FieldRef::DropPct(s, d) => spawn(s)
                .and_then(|sp| sp.drops.entries.get(d))
                .map(|e| e.percentage.clone()),
            _ => None,
        }
    }

    fn confirm_edit(&mut self, slot: FieldRef, buffer: String) {
        let Some(form) = self.form.as_mut() else {
            return;
        };
        match slot {
            FieldRef::InstalledMods => form.installed_mods = buffer,
            FieldRef::UninstalledMods => form.uninstalled_mods = buffer,
            FieldRef::SpawnId(s) => set_spawn(form, s, |sp| sp.id = buffer.clone()),
            FieldRef::SpawnPokemon(s) => set_spawn(form, s, |sp| sp.pokemon = buffer.clone()),
            FieldRef::SpawnPresets(s) => set_spawn(form, s, |sp| {
                sp.presets = buffer
                    .split(',')
                    .map(str::trim)
                    .filter(|p| !p.is_empty())
                    .map(str::to_string)
                    .collect();
            }),
            FieldRef::SpawnLevel(s) => set_spawn(form, s, |sp| sp.level = buffer.clone()),
            FieldRef::SpawnWeight(s) => set_spawn(form, s, |sp| sp.weight = buffer.clone()),
            FieldRef::HerdSize(s) => set_spawn(form, s, |sp| sp.max_herd_size = buffer.clone()),
            FieldRef::HerdDistance(s) => {
                set_spawn(form, s, |sp| sp.min_herd_distance = buffer.clone())
            }
            FieldRef::MemberPokemon(s, m) => set_member(form, s, m, |hm| {
                hm.pokemon = buffer.clone();
            }),
            FieldRef::MemberLevelRange(s, m) => set_member(form, s, m, |hm| {
                hm.level_range = buffer.clone();
            }),
            FieldRef::MemberWeight(s, m) => set_member(form, s, m, |hm| {
                hm.weight = buffer.clone();
            }),
            FieldRef::MemberMaxTimes(s, m) => set_member(form, s, m, |hm| {
                hm.max_times = buffer.clone();
            }),
            FieldRef::MemberOffset(s, m) => set_member(form, s, m, |hm| {
                hm.level_range_offset = buffer.clone();
            }),
            FieldRef::MultiplierValue(s, w) => {
                if let Some(wm) = form.spawns.get_mut(s).and_then(|sp| sp.multipliers.get_mut(w))
                {
                    wm.multiplier = buffer;
                }
            }
            FieldRef::CondInt(s, target, i) => {
                if let Some(c) = form.spawns.get_mut(s).and_then(|sp| cond_of_mut(sp, target)) {
                    c.ints[i].text = buffer;
                }
            }
            FieldRef::CondList(s, target, i) => {
                if let Some(c) = form.spawns.get_mut(s).and_then(|sp| cond_of_mut(sp, target)) {
                    // The form model keeps one entry per line.
                    c.lists[i] = buffer
                        .split(',')
                        .map(str::trim)
                        .filter(|v| !v.is_empty())
                        .collect::<Vec<_>>()
                        .join("\n");
                }
            }
            FieldRef::CondString(s, target, i) => {
                if let Some(c) = form.spawns.get_mut(s).and_then(|sp| cond_of_mut(sp, target)) {
                    c.strings[i] = buffer;
                }
            }
            FieldRef::DropsAmount(s) => set_spawn(form, s, |sp| sp.drops.amount = buffer.clone()),
            FieldRef::DropItem(s, d) => set_drop(form, s, d, |e| e.item = buffer.clone()),
            FieldRef::DropQty(s, d) => {
                set_drop(form, s, d, |e| e.quantity_range = buffer.clone())
            }
            FieldRef::DropPct(s, d) => set_drop(form, s, d, |e| e.percentage = buffer.clone()),
            _ => {}
        }
    }

    fn toggle(&mut self, slot: FieldRef) {
        let Some(form) = self.form.as_mut() else {
            return;
        };
        match slot {
            FieldRef::Enabled => form.enabled = !form.enabled,
            FieldRef::MemberLeader(s, m) => set_member(form, s, m, |hm| {
                hm.is_leader = !hm.is_leader;
            }),
            FieldRef::CondFlag(s, target, i) => {
                if let Some(c) = form.spawns.get_mut(s).and_then(|sp| cond_of_mut(sp, target)) {
                    c.flags[i] = !c.flags[i];
                }
            }
            FieldRef::DropsEnabled(s) => set_spawn(form, s, |sp| {
                sp.drops.enabled = !sp.drops.enabled;
            }),
            _ => {}
        }
    }

    fn cycle(&mut self, slot: FieldRef, forward: bool) {
        let Some(form) = self.form.as_mut() else {
            return;
        };
        match slot {
            FieldRef::SpawnType(s) => {
                if let Some(sp) = form.spawns.get_mut(s) {
                    let next = cycle_in(SpawnType::all(), &sp.spawn_type, forward);
                    sp.set_spawn_type(next);
                }
            }
            FieldRef::SpawnPosition(s) => set_spawn(form, s, |sp| {
                sp.position = cycle_in(PositionType::all(), &sp.position, forward);
            }),
            FieldRef::SpawnBucket(s) => set_spawn(form, s, |sp| {
                sp.bucket = cycle_in(Bucket::all(), &sp.bucket, forward);
            }),
            FieldRef::CondTime(s, target) => {
                if let Some(c) = form.spawns.get_mut(s).and_then(|sp| cond_of_mut(sp, target)) {
                    c.time_range = cycle_in(TimeRange::all(), &c.time_range, forward);
                }
            }
            FieldRef::CondMoon(s, target) => {
                if let Some(c) = form.spawns.get_mut(s).and_then(|sp| cond_of_mut(sp, target)) {
                    c.moon_phase = cycle_in(MoonPhase::all(), &c.moon_phase, forward);
                }
            }
            _ => {}
        }
    }

    /// Enter on an action row. Returns true when the row list must be
    /// rebuilt because rows were added or removed.
    fn activate(&mut self, slot: FieldRef) -> bool {
        match slot {
            FieldRef::AddSpawn => {
                if let Some(form) = self.form.as_mut() {
                    form.add_spawn();
                }
                true
            }
            FieldRef::Save => {
                self.save_current();
                false
            }
            FieldRef::DeleteSpawn(s) => {
                if let Some(form) = self.form.as_mut() {
                    if let Some(row_id) = form.spawns.get(s).map(|sp| sp.row_id) {
                        form.remove_spawn(row_id);
                    }
                }
                true
            }
            FieldRef::AddMember(s) => {
                if let Some(form) = self.form.as_mut() {
                    set_spawn(form, s, |sp| sp.add_herd_member());
                }
                true
            }
            FieldRef::DeleteMember(s, m) => {
                if let Some(form) = self.form.as_mut() {
                    set_spawn(form, s, |sp| {
                        if let Some(row_id) = sp.herd_members.get(m).map(|hm| hm.row_id) {
                            sp.remove_herd_member(row_id);
                        }
                    });
                }
                true
            }
            FieldRef::AddMultiplier(s) => {
                if let Some(form) = self.form.as_mut() {
                    set_spawn(form, s, |sp| sp.add_multiplier());
                }
                true
            }
            FieldRef::DeleteMultiplier(s, w) => {
                if let Some(form) = self.form.as_mut() {
                    set_spawn(form, s, |sp| {
                        if let Some(row_id) = sp.multipliers.get(w).map(|wm| wm.row_id) {
                            sp.remove_multiplier(row_id);
                        }
                    });
                }
                true
            }
            FieldRef::AddDropEntry(s) => {
                if let Some(form) = self.form.as_mut() {
                    set_spawn(form, s, |sp| {
                        sp.drops.entries.push(crate::forms::DropEntryForm::template());
                    });
                }
                true
            }
            FieldRef::DeleteDropEntry(s, d) => {
                if let Some(form) = self.form.as_mut() {
                    set_spawn(form, s, |sp| {
                        if let Some(row_id) = sp.drops.entries.get(d).map(|e| e.row_id) {
                            sp.drops.entries.retain(|e| e.row_id != row_id);
                        }
                    });
                }
                true
            }
            _ => false,
        }
    }

    // ------------------------------------------------------------------
    // Input handling
    // ------------------------------------------------------------------

    fn handle_key(&mut self, code: KeyCode, rows: &[FormRow]) {
        if self.confirm.is_some() {
            self.handle_confirm_key(code);
            return;
        }
        if self.searching {
            match code {
                KeyCode::Enter | KeyCode::Esc => self.searching = false,
                KeyCode::Backspace => {
                    self.search.pop();
                    self.list_index = 0;
                }
                KeyCode::Char(c) => {
                    self.search.push(c);
                    self.list_index = 0;
                }
                _ => {}
            }
            return;
        }
        if self.editing {
            match code {
                KeyCode::Enter => {
                    self.editing = false;
                    if let Some(slot) = rows.get(self.selected_row).and_then(|r| r.slot) {
                        let buffer = std::mem::take(&mut self.input_buffer);
                        self.confirm_edit(slot, buffer);
                    }
                }
                KeyCode::Esc => {
                    self.editing = false;
                    self.input_buffer.clear();
                }
                KeyCode::Backspace => {
                    self.input_buffer.pop();
                }
                KeyCode::Char(c) => {
                    self.input_buffer.push(c);
                }
                _ => {}
            }
            return;
        }

        match self.pane {
            Pane::List => self.handle_list_key(code),
            Pane::Form => self.handle_form_key(code, rows),
        }
    }

    fn handle_list_key(&mut self, code: KeyCode) {
        let count = self.filtered_files().len();
        match code {
            KeyCode::Char('q') | KeyCode::Esc => self.quit = true,
            KeyCode::Up | KeyCode::Char('k') => {
                self.list_index = self.list_index.saturating_sub(1);
            }
            KeyCode::Down | KeyCode::Char('j') => {
                if count > 0 && self.list_index + 1 < count {
                    self.list_index += 1;
                }
            }
            KeyCode::Char('/') => self.searching = true,
            KeyCode::Char('r') => self.confirm = Some(ConfirmAction::Reset),
            KeyCode::Char('b') => self.confirm = Some(ConfirmAction::Blank),
            KeyCode::Enter => self.open_selected(),
            KeyCode::Tab => {
                if self.form.is_some() {
                    self.pane = Pane::Form;
                }
            }
            _ => {}
        }
    }

    fn handle_form_key(&mut self, code: KeyCode, rows: &[FormRow]) {
        let slot = rows.get(self.selected_row).and_then(|r| r.slot);
        match code {
            KeyCode::Char('q') | KeyCode::Esc => self.pane = Pane::List,
            KeyCode::Tab => self.pane = Pane::List,
            KeyCode::Up | KeyCode::Char('k') => self.select_prev(rows),
            KeyCode::Down | KeyCode::Char('j') => self.select_next(rows),
            KeyCode::Left | KeyCode::Char('h') => {
                if let Some(slot) = slot {
                    self.cycle(slot, false);
                }
            }
            KeyCode::Right | KeyCode::Char('l') => {
                if let Some(slot) = slot {
                    self.cycle(slot, true);
                }
            }
            KeyCode::Char('s') => self.save_current(),
            KeyCode::Char(' ') | KeyCode::Enter => {
                let Some(slot) = slot else {
                    return;
                };
                if self.activate(slot) {
                    let rebuilt = self.build_rows();
                    if self.selected_row >= rebuilt.len() && !rebuilt.is_empty() {
                        self.selected_row = rebuilt.len() - 1;
                    }
                    return;
                }
                self.toggle(slot);
                if code == KeyCode::Enter {
                    if let Some(buffer) = self.edit_buffer(slot) {
                        self.editing = true;
                        self.input_buffer = buffer;
                    }
                }
            }
            _ => {}
        }
    }

    fn handle_confirm_key(&mut self, code: KeyCode) {
        let Some(action) = self.confirm else {
            return;
        };
        match code {
            KeyCode::Char('y') | KeyCode::Enter => {
                self.confirm = None;
                match action {
                    ConfirmAction::Reset => self.start_seed(SeedJob::Reset),
                    ConfirmAction::Blank => {
                        self.form = None;
                        let seeder = Seeder::new(self.store.dir());
                        match seeder.blank_all() {
                            Ok(n) => self.status = format!("{} file(s) set to blank", n),
                            Err(e) => self.status = e.to_string(),
                        }
                        self.files = self.store.list_files();
                    }
                }
            }
            KeyCode::Char('n') | KeyCode::Esc => self.confirm = None,
            _ => {}
        }
    }

    fn select_prev(&mut self, rows: &[FormRow]) {
        let mut i = self.selected_row;
        while i > 0 {
            i -= 1;
            if rows[i].slot.is_some() {
                self.selected_row = i;
                return;
            }
        }
    }

    fn select_next(&mut self, rows: &[FormRow]) {
        let mut i = self.selected_row;
        while i + 1 < rows.len() {
            i += 1;
            if rows[i].slot.is_some() {
                self.selected_row = i;
                return;
            }
        }
    }

    // ------------------------------------------------------------------
    // Rendering
    // ------------------------------------------------------------------

    fn render(&self, frame: &mut Frame, rows: &[FormRow]) {
        let area = frame.area();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(3), Constraint::Length(1)])
            .split(area);
        let panes = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(32), Constraint::Min(20)])
            .split(chunks[0]);

        self.render_list(frame, panes[0]);
        self.render_form(frame, panes[1], rows);
        self.render_status(frame, chunks[1]);

        if self.seed_rx.is_some() {
            self.render_modal(frame, area, "Please wait", &self.seed_label);
        } else if let Some(action) = self.confirm {
            let text = match action {
                ConfirmAction::Reset => {
                    "Restore all files to default? This re-downloads everything. (y/n)"
                }
                ConfirmAction::Blank => "Set ALL spawn files to blank? (y/n)",
            };
            self.render_modal(frame, area, "Confirm", text);
        }
    }

    fn render_list(&self, frame: &mut Frame, area: Rect) {
        let focused = self.pane == Pane::List;
        let border_style = if focused {
            Style::default().fg(Color::Cyan)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        let block = Block::default()
            .title(" Pokemon ")
            .borders(Borders::ALL)
            .border_style(border_style);
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let search_style = if self.searching {
            Style::default().fg(Color::Black).bg(Color::Yellow)
        } else {
            Style::default().fg(Color::White)
        };
        let search_line = if self.searching {
            format!("Search: {}_", self.search)
        } else if self.search.is_empty() {
            "Search: (press /)".to_string()
        } else {
            format!("Search: {}", self.search)
        };
        frame.render_widget(
            Paragraph::new(search_line).style(search_style),
            Rect::new(inner.x, inner.y, inner.width, 1),
        );

        let files = self.filtered_files();
        let visible = inner.height.saturating_sub(2) as usize;
        let first = if self.list_index >= visible && visible > 0 {
            self.list_index + 1 - visible
        } else {
            0
        };
        for (row, file) in files.iter().skip(first).take(visible).enumerate() {
            let index = first + row;
            let style = if index == self.list_index && focused {
                Style::default().fg(Color::Black).bg(Color::Yellow)
            } else if index == self.list_index {
                Style::default().fg(Color::Yellow)
            } else {
                Style::default().fg(Color::White)
            };
            frame.render_widget(
                Paragraph::new(file.display_name()).style(style),
                Rect::new(inner.x, inner.y + 2 + row as u16, inner.width, 1),
            );
        }
    }

    fn render_form(&self, frame: &mut Frame, area: Rect, rows: &[FormRow]) {
        let focused = self.pane == Pane::Form;
        let border_style = if focused {
            Style::default().fg(Color::Cyan)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        let title = match &self.form {
            Some(form) => format!(" {} ", form.file.display_name()),
            None => " Spawn Editor ".to_string(),
        };
        let block = Block::default()
            .title(title)
            .borders(Borders::ALL)
            .border_style(border_style);
        let inner = block.inner(area);
        frame.render_widget(block, area);

        if self.form.is_none() {
            frame.render_widget(
                Paragraph::new("Select a Pokemon and press Enter")
                    .style(Style::default().fg(Color::DarkGray)),
                Rect::new(inner.x + 1, inner.y + 1, inner.width.saturating_sub(1), 1),
            );
            return;
        }

        let visible = inner.height as usize;
        let first = if self.selected_row >= visible && visible > 0 {
            self.selected_row + 1 - visible
        } else {
            0
        };
        for (row, form_row) in rows.iter().skip(first).take(visible).enumerate() {
            let index = first + row;
            let y = inner.y + row as u16;
            let selected = index == self.selected_row && focused;
            let editing = selected && self.editing;

            let text = if form_row.header {
                form_row.label.clone()
            } else if form_row.value.is_empty() && form_row.label.starts_with('[') {
                format!(
                    "{:indent$}{}",
                    "",
                    form_row.label,
                    indent = form_row.indent as usize * 2
                )
            } else {
                let value = if editing {
                    format!("{}_", self.input_buffer)
                } else {
                    form_row.value.clone()
                };
                format!(
                    "{:indent$}{:<26} {}",
                    "",
                    format!("{}:", form_row.label),
                    value,
                    indent = form_row.indent as usize * 2
                )
            };

            let style = if form_row.header {
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD)
            } else if editing {
                Style::default().fg(Color::Black).bg(Color::Green)
            } else if selected {
                Style::default().fg(Color::Black).bg(Color::Yellow)
            } else {
                Style::default().fg(Color::White)
            };
            frame.render_widget(
                Paragraph::new(text).style(style),
                Rect::new(inner.x, y, inner.width, 1),
            );
        }
    }

    fn render_status(&self, frame: &mut Frame, area: Rect) {
        let help = if self.editing {
            "Type value  Enter: confirm  Esc: cancel"
        } else if self.pane == Pane::List {
            "↑↓/jk: navigate  Enter: open  /: search  r: restore defaults  b: blank all  q: quit"
        } else {
            "↑↓/jk: field  ←→/hl: cycle  Enter: edit/toggle  s: save  Tab/Esc: back to list"
        };
        let line = if self.status.is_empty() {
            help.to_string()
        } else {
            format!("{}  |  {}", self.status, help)
        };
        frame.render_widget(
            Paragraph::new(line).style(Style::default().fg(Color::DarkGray)),
            area,
        );
    }

    fn render_modal(&self, frame: &mut Frame, area: Rect, title: &str, text: &str) {
        let width = (text.len() as u16 + 6).clamp(30, area.width.saturating_sub(4));
        let height = 5;
        let x = (area.width.saturating_sub(width)) / 2;
        let y = (area.height.saturating_sub(height)) / 2;
        let modal = Rect::new(x, y, width, height);
        frame.render_widget(Clear, modal);
        let block = Block::default()
            .title(format!(" {} ", title))
            .title_alignment(Alignment::Center)
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan));
        let inner = block.inner(modal);
        frame.render_widget(block, modal);
        frame.render_widget(
            Paragraph::new(text).alignment(Alignment::Center),
            Rect::new(inner.x, inner.y + 1, inner.width, 1),
        );
    }
}

fn checkbox(value: bool) -> String {
    if value { "[x]".to_string() } else { "[ ]".to_string() }
}

fn cycle_in<T: Copy + PartialEq>(values: &[T], current: &T, forward: bool) -> T {
    let index = values.iter().position(|v| v == current).unwrap_or(0);
    let next = if forward {
        (index + 1) % values.len()
    } else {
        (index + values.len() - 1) % values.len()
    };
    values[next]
}

fn cond_of(spawn: &crate::forms::SpawnForm, target: CondTarget) -> Option<&ConditionForm> {
    match target {
        CondTarget::Condition => Some(&spawn.condition),
        CondTarget::Anticondition => Some(&spawn.anticondition),
        CondTarget::Multiplier(w) => spawn.multipliers.get(w).map(|wm| &wm.condition),
    }
}

fn cond_of_mut(
    spawn: &mut crate::forms::SpawnForm,
    target: CondTarget,
) -> Option<&mut ConditionForm> {
    match target {
        CondTarget::Condition => Some(&mut spawn.condition),
        CondTarget::Anticondition => Some(&mut spawn.anticondition),
        CondTarget::Multiplier(w) => spawn.multipliers.get_mut(w).map(|wm| &mut wm.condition),
    }
}

fn set_spawn(
    form: &mut DocumentForm,
    index: usize,
    apply: impl FnOnce(&mut crate::forms::SpawnForm),
) {
    if let Some(spawn) = form.spawns.get_mut(index) {
        apply(spawn);
    }
}

fn set_member(
    form: &mut DocumentForm,
    spawn: usize,
    member: usize,
    apply: impl FnOnce(&mut crate::forms::HerdMemberForm),
) {
    if let Some(hm) = form
        .spawns
        .get_mut(spawn)
        .and_then(|sp| sp.herd_members.get_mut(member))
    {
        apply(hm);
    }
}

fn set_drop(
    form: &mut DocumentForm,
    spawn: usize,
    entry: usize,
    apply: impl FnOnce(&mut crate::forms::DropEntryForm),
) {
    if let Some(e) = form
        .spawns
        .get_mut(spawn)
        .and_then(|sp| sp.drops.entries.get_mut(entry))
    {
        apply(e);
    }
}

/// Run the terminal editor until the user quits.
pub fn run_tui(store: SpawnFileStore) -> Result<(), Box<dyn Error>> {
    terminal::enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = TuiApp::new(store);
    let result = run_loop(&mut terminal, &mut app);

    terminal::disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    result
}

fn run_loop(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    app: &mut TuiApp,
) -> Result<(), Box<dyn Error>> {
    loop {
        app.poll_seed();
        let rows = app.build_rows();
        terminal.draw(|f| app.render(f, &rows))?;

        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                // Seeding is not cancellable; ignore input until it ends.
                if app.seed_rx.is_some() {
                    continue;
                }
                app.handle_key(key.code, &rows);
            }
        }
        if app.quit {
            return Ok(());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{SpawnEntry, SpawnPool};
    use crate::forms::DocumentForm;

    fn form_with_one_spawn() -> DocumentForm {
        let mut pool = SpawnPool::default();
        pool.spawns.push(SpawnEntry::template("pidgey", 0));
        DocumentForm::from_pool(SpeciesFile::from_file_name("0016_pidgey.json"), &pool)
    }

    // Built by hand so the constructor's first-run seeding never kicks in
    // during tests.
    fn app_with_form(form: DocumentForm) -> TuiApp {
        TuiApp {
            store: SpawnFileStore::new(std::env::temp_dir().join("spawn_editor_test_tui")),
            files: Vec::new(),
            search: String::new(),
            searching: false,
            list_index: 0,
            pane: Pane::Form,
            form: Some(form),
            selected_row: 0,
            editing: false,
            input_buffer: String::new(),
            status: String::new(),
            confirm: None,
            seed_rx: None,
            seed_label: String::new(),
            quit: false,
        }
    }

    #[test]
    fn test_rows_cover_every_spawn_field() {
        let app = app_with_form(form_with_one_spawn());
        let rows = app.build_rows();
        let slots: Vec<FieldRef> = rows.iter().filter_map(|r| r.slot).collect();
        assert!(slots.contains(&FieldRef::Enabled));
        assert!(slots.contains(&FieldRef::SpawnId(0)));
        assert!(slots.contains(&FieldRef::SpawnPokemon(0)));
        assert!(slots.contains(&FieldRef::SpawnWeight(0)));
        assert!(slots.contains(&FieldRef::CondTime(0, CondTarget::Condition)));
        assert!(slots.contains(&FieldRef::CondInt(0, CondTarget::Anticondition, 0)));
        assert!(slots.contains(&FieldRef::AddSpawn));
        assert!(slots.contains(&FieldRef::Save));
    }

    #[test]
    fn test_herd_rows_replace_pokemon_row() {
        let mut form = form_with_one_spawn();
        form.spawns[0].set_spawn_type(SpawnType::PokemonHerd);
        let app = app_with_form(form);
        let rows = app.build_rows();
        let slots: Vec<FieldRef> = rows.iter().filter_map(|r| r.slot).collect();
        assert!(!slots.contains(&FieldRef::SpawnPokemon(0)));
        assert!(slots.contains(&FieldRef::HerdSize(0)));
        assert!(slots.contains(&FieldRef::AddMember(0)));
    }

    #[test]
    fn test_edit_confirm_writes_back() {
        let mut app = app_with_form(form_with_one_spawn());
        app.confirm_edit(FieldRef::SpawnWeight(0), "2.5".to_string());
        let form = app.form.as_ref().unwrap();
        assert_eq!(form.spawns[0].weight, "2.5");
        assert_eq!(form.commit().spawns[0].weight, 2.5);
    }

    #[test]
    fn test_cycle_spawn_type_discards_pokemon() {
        let mut app = app_with_form(form_with_one_spawn());
        app.cycle(FieldRef::SpawnType(0), true);
        let form = app.form.as_ref().unwrap();
        assert_eq!(form.spawns[0].spawn_type, SpawnType::PokemonHerd);
        assert!(form.spawns[0].pokemon.is_empty());
    }

    #[test]
    fn test_comma_separated_list_maps_to_lines() {
        let mut app = app_with_form(form_with_one_spawn());
        app.confirm_edit(
            FieldRef::CondList(0, CondTarget::Condition, 0),
            "plains, forest".to_string(),
        );
        let form = app.form.as_ref().unwrap();
        assert_eq!(form.spawns[0].condition.lists[0], "plains\nforest");
        let committed = form.commit();
        assert_eq!(committed.spawns[0].condition.lists[0], vec!["plains", "forest"]);
    }

    #[test]
    fn test_activate_add_and_delete_member() {
        let mut form = form_with_one_spawn();
        form.spawns[0].set_spawn_type(SpawnType::PokemonHerd);
        let mut app = app_with_form(form);

        assert!(app.activate(FieldRef::AddMember(0)));
        assert_eq!(app.form.as_ref().unwrap().spawns[0].herd_members.len(), 1);

        assert!(app.activate(FieldRef::DeleteMember(0, 0)));
        assert!(app.form.as_ref().unwrap().spawns[0].herd_members.is_empty());
    }
}
