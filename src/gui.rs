//! Desktop editor surface built on eframe/egui.
//!
//! A sidebar lists species files with incremental search; the central
//! panel renders the selected document as an editable form bound to the
//! shared form model. Seeding runs on a worker thread and reports back
//! over a channel so the UI stays responsive; the fetch itself is not
//! cancellable — the surface waits for completion or failure.

use std::sync::mpsc::{self, Receiver};
use std::thread;
use std::time::Duration;

use crate::error::SeedError;
use crate::forms::{ConditionForm, DocumentForm, DropEntryForm, SpawnForm};
use crate::schema::{
    Bucket, MoonPhase, PositionType, SpawnType, TimeRange, CONDITION_BOOL_FIELDS,
    CONDITION_INT_FIELDS, CONDITION_LIST_FIELDS, CONDITION_STRING_FIELDS, PRESET_OPTIONS,
};
use crate::seeder::{SeedProgress, SeedReport, Seeder};
use crate::store::{SpawnFileStore, SpeciesFile};

enum SeedJob {
    Ensure,
    Reset,
}

enum SeedEvent {
    Progress(SeedProgress),
    Finished(Result<SeedReport, SeedError>),
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum ConfirmAction {
    Reset,
    Blank,
}

pub struct EditorApp {
    store: SpawnFileStore,
    files: Vec<SpeciesFile>,
    species_names: Vec<String>,
    search: String,
    form: Option<DocumentForm>,
    status: String,
    seed_rx: Option<Receiver<SeedEvent>>,
    seed_label: String,
    confirm: Option<ConfirmAction>,
}

impl EditorApp {
    pub fn new(store: SpawnFileStore) -> EditorApp {
        let mut app = EditorApp {
            store,
            files: Vec::new(),
            species_names: Vec::new(),
            search: String::new(),
            form: None,
            status: String::new(),
            seed_rx: None,
            seed_label: String::new(),
            confirm: None,
        };
        if app.store.is_populated() {
            app.refresh_files();
        } else {
            app.start_seed(SeedJob::Ensure);
        }
        app
    }

    fn refresh_files(&mut self) {
        self.files = self.store.list_files();
        self.species_names = self.store.species_names();
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
                        "Seeded: {} downloaded, {} blank(s) created, {} file(s) total",
                        report.spawn_files_written, report.blanks_created, report.total_files
                    );
                }
                Err(e) => self.status = format!("Seeding failed: {}", e),
            }
            self.refresh_files();
        }
    }

    fn select_file(&mut self, file: SpeciesFile) {
        match self.store.load(&file) {
            Ok(pool) => {
                self.form = Some(DocumentForm::from_pool(file, &pool));
                self.status.clear();
            }
            Err(e) => {
                self.form = None;
                self.status = e.to_string();
            }
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
}

impl eframe::App for EditorApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.poll_seed();
        let seeding = self.seed_rx.is_some();
        if seeding {
            ctx.request_repaint_after(Duration::from_millis(100));
        }

        let mut selected_file = None;
        let mut confirm_requested = None;
        egui::SidePanel::left("species_panel")
            .default_width(260.0)
            .show(ctx, |ui| {
                ui.add_space(4.0);
                ui.heading("Pokemon");
                ui.add(
                    egui::TextEdit::singleline(&mut self.search)
                        .hint_text("Search")
                        .desired_width(f32::INFINITY),
                );
                ui.separator();

                let search = self.search.to_lowercase();
                let current = self.form.as_ref().map(|f| f.file.file_name.clone());
                egui::ScrollArea::vertical()
                    .auto_shrink([false; 2])
                    .show(ui, |ui| {
                        for file in &self.files {
                            let display = file.display_name();
                            if !search.is_empty()
                                && !display.to_lowercase().contains(&search)
                                && !file.file_name.to_lowercase().contains(&search)
                            {
                                continue;
                            }
                            let is_current = current.as_deref() == Some(&file.file_name);
                            if ui.selectable_label(is_current, display).clicked() && !is_current {
                                selected_file = Some(file.clone());
                            }
                        }
                    });

                ui.separator();
                ui.add_enabled_ui(!seeding, |ui| {
                    if ui.button("Restore to default").clicked() {
                        confirm_requested = Some(ConfirmAction::Reset);
                    }
                    if ui.button("Set all to blank").clicked() {
                        confirm_requested = Some(ConfirmAction::Blank);
                    }
                });
            });
        if let Some(file) = selected_file {
            if !seeding {
                self.select_file(file);
            }
        }
        if confirm_requested.is_some() {
            self.confirm = confirm_requested;
        }

        egui::TopBottomPanel::bottom("status_panel").show(ctx, |ui| {
            ui.label(&self.status);
        });

        let mut do_save = false;
        {
            let form = &mut self.form;
            let species_names = &self.species_names;
            let seed_label = &self.seed_label;
            egui::CentralPanel::default().show(ctx, |ui| {
                if seeding {
                    ui.vertical_centered(|ui| {
                        ui.add_space(80.0);
                        ui.spinner();
                        ui.label(seed_label.as_str());
                    });
                    return;
                }
                let Some(form) = form.as_mut() else {
                    ui.vertical_centered(|ui| {
                        ui.add_space(80.0);
                        ui.label("Select a Pokemon");
                    });
                    return;
                };

                ui.add_space(4.0);
                ui.heading(form.file.display_name());
                ui.horizontal(|ui| {
                    ui.checkbox(&mut form.enabled, "Enabled");
                    ui.label("Needed installed mods:");
                    ui.add(
                        egui::TextEdit::singleline(&mut form.installed_mods).desired_width(180.0),
                    );
                    ui.label("Needed uninstalled mods:");
                    ui.add(
                        egui::TextEdit::singleline(&mut form.uninstalled_mods)
                            .desired_width(180.0),
                    );
                });
                ui.separator();

                let mut remove_spawn = None;
                egui::ScrollArea::vertical()
                    .auto_shrink([false; 2])
                    .show(ui, |ui| {
                        for spawn in &mut form.spawns {
                            ui.push_id(spawn.row_id, |ui| {
                                egui::Frame::group(ui.style()).show(ui, |ui| {
                                    if spawn_ui(ui, spawn, species_names) {
                                        remove_spawn = Some(spawn.row_id);
                                    }
                                });
                            });
                            ui.add_space(6.0);
                        }
                        ui.horizontal(|ui| {
                            if ui.button("Add new spawn").clicked() {
                                form.add_spawn();
                            }
                            if ui.button("Save").clicked() {
                                do_save = true;
                            }
                        });
                    });
                if let Some(row_id) = remove_spawn {
                    form.remove_spawn(row_id);
                }
            });
        }
        if do_save {
            self.save_current();
        }

        if let Some(action) = self.confirm {
            let title = match action {
                ConfirmAction::Reset => "Restore all files to default?",
                ConfirmAction::Blank => "Set ALL spawn files to blank?",
            };
            let mut decided = None;
            egui::Window::new("Confirm")
                .collapsible(false)
                .resizable(false)
                .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
                .show(ctx, |ui| {
                    ui.label(title);
                    ui.horizontal(|ui| {
                        if ui.button("OK").clicked() {
                            decided = Some(true);
                        }
                        if ui.button("Cancel").clicked() {
                            decided = Some(false);
                        }
                    });
                });
            if let Some(confirmed) = decided {
                self.confirm = None;
                if confirmed {
                    match action {
                        ConfirmAction::Reset => self.start_seed(SeedJob::Reset),
                        ConfirmAction::Blank => {
                            self.form = None;
                            let seeder = Seeder::new(self.store.dir());
                            match seeder.blank_all() {
                                Ok(n) => self.status = format!("{} file(s) set to blank", n),
                                Err(e) => self.status = e.to_string(),
                            }
                            self.refresh_files();
                        }
                    }
                }
            }
        }
    }
}

/// Render one spawn entry's editor. Returns true when deletion was
/// requested.
fn spawn_ui(ui: &mut egui::Ui, spawn: &mut SpawnForm, species_names: &[String]) -> bool {
    let mut delete = false;
    ui.horizontal(|ui| {
        ui.strong(format!("Spawn: {}", spawn.id));
        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
            if ui.button("Delete this spawn").clicked() {
                delete = true;
            }
        });
    });

    ui.horizontal(|ui| {
        ui.label("ID:");
        ui.add(egui::TextEdit::singleline(&mut spawn.id).desired_width(160.0));
        ui.label("Type:");
        let mut new_type = spawn.spawn_type;
        egui::ComboBox::from_id_salt((spawn.row_id, "type"))
            .selected_text(new_type.as_str())
            .show_ui(ui, |ui| {
                for ty in SpawnType::all() {
                    ui.selectable_value(&mut new_type, *ty, ty.as_str());
                }
            });
        if new_type != spawn.spawn_type {
            spawn.set_spawn_type(new_type);
        }
    });

    if !spawn.spawn_type.is_herd() {
        ui.horizontal(|ui| {
            ui.label("Pokemon:");
            ui.add(egui::TextEdit::singleline(&mut spawn.pokemon).desired_width(160.0));
        });
    }

    ui.horizontal(|ui| {
        ui.label("Position:");
        egui::ComboBox::from_id_salt((spawn.row_id, "position"))
            .selected_text(spawn.position.as_str())
            .show_ui(ui, |ui| {
                for pos in PositionType::all() {
                    ui.selectable_value(&mut spawn.position, *pos, pos.as_str());
                }
            });
        ui.label("Bucket:");
        egui::ComboBox::from_id_salt((spawn.row_id, "bucket"))
            .selected_text(spawn.bucket.as_str())
            .show_ui(ui, |ui| {
                for bucket in Bucket::all() {
                    ui.selectable_value(&mut spawn.bucket, *bucket, bucket.as_str());
                }
            });
        ui.label("Level range:");
        ui.add(egui::TextEdit::singleline(&mut spawn.level).desired_width(70.0));
        ui.label("Weight:");
        ui.add(egui::TextEdit::singleline(&mut spawn.weight).desired_width(70.0));
    });

    presets_ui(ui, spawn);

    if spawn.spawn_type.is_herd() {
        herd_ui(ui, spawn, species_names);
    }

    egui::CollapsingHeader::new("Weight multipliers")
        .id_salt((spawn.row_id, "multipliers"))
        .show(ui, |ui| {
            let mut remove = None;
            for (index, wm) in spawn.multipliers.iter_mut().enumerate() {
                ui.push_id(wm.row_id, |ui| {
                    ui.horizontal(|ui| {
                        ui.label(format!("Multiplier {}:", index + 1));
                        ui.add(
                            egui::TextEdit::singleline(&mut wm.multiplier).desired_width(70.0),
                        );
                        if ui.button("Delete").clicked() {
                            remove = Some(wm.row_id);
                        }
                    });
                    egui::CollapsingHeader::new("Multiplier condition")
                        .id_salt((wm.row_id, "condition"))
                        .default_open(true)
                        .show(ui, |ui| {
                            condition_ui(ui, &mut wm.condition, wm.row_id);
                        });
                });
            }
            if let Some(row_id) = remove {
                spawn.remove_multiplier(row_id);
            }
            if ui.button("Add multiplier").clicked() {
                spawn.add_multiplier();
            }
        });

    egui::CollapsingHeader::new("Condition")
        .id_salt((spawn.row_id, "condition"))
        .show(ui, |ui| {
            condition_ui(ui, &mut spawn.condition, spawn.row_id.wrapping_mul(2));
        });
    egui::CollapsingHeader::new("Anticondition")
        .id_salt((spawn.row_id, "anticondition"))
        .show(ui, |ui| {
            condition_ui(ui, &mut spawn.anticondition, spawn.row_id.wrapping_mul(2) + 1);
        });

    egui::CollapsingHeader::new("Drops")
        .id_salt((spawn.row_id, "drops"))
        .show(ui, |ui| {
            drops_ui(ui, spawn);
        });

    delete
}

fn presets_ui(ui: &mut egui::Ui, spawn: &mut SpawnForm) {
    let summary = if spawn.presets.is_empty() {
        "(none)".to_string()
    } else {
        spawn.presets.join(", ")
    };
    egui::CollapsingHeader::new(format!("Presets: {}", summary))
        .id_salt((spawn.row_id, "presets"))
        .show(ui, |ui| {
            // Curated tokens first, then any unknown tokens from the file.
            let mut tokens: Vec<String> =
                PRESET_OPTIONS.iter().map(|p| p.to_string()).collect();
            for preset in &spawn.presets {
                if !tokens.contains(preset) {
                    tokens.push(preset.clone());
                }
            }
            ui.horizontal_wrapped(|ui| {
                for token in &tokens {
                    let mut checked = spawn.presets.contains(token);
                    if ui.checkbox(&mut checked, token).changed() {
                        if checked {
                            spawn.presets.push(token.clone());
                        } else {
                            spawn.presets.retain(|p| p != token);
                        }
                    }
                }
            });
        });
}

fn herd_ui(ui: &mut egui::Ui, spawn: &mut SpawnForm, species_names: &[String]) {
    ui.group(|ui| {
        ui.strong("Herd settings");
        ui.horizontal(|ui| {
            ui.label("Max herd size:");
            ui.add(egui::TextEdit::singleline(&mut spawn.max_herd_size).desired_width(50.0));
            ui.label("Min distance between spawns:");
            ui.add(
                egui::TextEdit::singleline(&mut spawn.min_herd_distance).desired_width(60.0),
            );
        });

        let mut remove = None;
        for (index, member) in spawn.herd_members.iter_mut().enumerate() {
            ui.push_id(member.row_id, |ui| {
                ui.separator();
                ui.horizontal(|ui| {
                    ui.label(format!("Herd member {}", index + 1));
                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        if ui.button("Delete").clicked() {
                            remove = Some(member.row_id);
                        }
                    });
                });
                ui.horizontal(|ui| {
                    ui.label("Pokemon:");
                    egui::ComboBox::from_id_salt((member.row_id, "pokemon"))
                        .selected_text(member.pokemon.clone())
                        .show_ui(ui, |ui| {
                            for name in species_names {
                                ui.selectable_value(&mut member.pokemon, name.clone(), name);
                            }
                        });
                    ui.label("Level range:");
                    ui.add(
                        egui::TextEdit::singleline(&mut member.level_range).desired_width(70.0),
                    );
                    ui.label("Weight:");
                    ui.add(egui::TextEdit::singleline(&mut member.weight).desired_width(60.0));
                });
                ui.horizontal(|ui| {
                    ui.checkbox(&mut member.is_leader, "Is leader");
                    ui.label("Max times (0 = unlimited):");
                    ui.add(
                        egui::TextEdit::singleline(&mut member.max_times).desired_width(50.0),
                    );
                    ui.label("Level range offset:");
                    ui.add(
                        egui::TextEdit::singleline(&mut member.level_range_offset)
                            .desired_width(70.0),
                    );
                });
            });
        }
        if let Some(row_id) = remove {
            spawn.remove_herd_member(row_id);
        }
        if ui.button("Add herd member").clicked() {
            spawn.add_herd_member();
        }
    });
}

fn drops_ui(ui: &mut egui::Ui, spawn: &mut SpawnForm) {
    let drops = &mut spawn.drops;
    ui.checkbox(&mut drops.enabled, "Enable drops");
    if !drops.enabled {
        return;
    }
    ui.horizontal(|ui| {
        ui.label("Drop amount:");
        ui.add(egui::TextEdit::singleline(&mut drops.amount).desired_width(50.0));
    });
    let mut remove = None;
    for entry in drops.entries.iter_mut() {
        ui.push_id(entry.row_id, |ui| {
            ui.horizontal(|ui| {
                ui.label("Item:");
                ui.add(egui::TextEdit::singleline(&mut entry.item).desired_width(170.0));
                ui.label("Qty range:");
                ui.add(
                    egui::TextEdit::singleline(&mut entry.quantity_range).desired_width(60.0),
                );
                ui.label("% chance:");
                ui.add(egui::TextEdit::singleline(&mut entry.percentage).desired_width(60.0));
                if ui.button("X").clicked() {
                    remove = Some(entry.row_id);
                }
            });
        });
    }
    if let Some(row_id) = remove {
        drops.entries.retain(|e| e.row_id != row_id);
    }
    if ui.button("Add drop entry").clicked() {
        drops.entries.push(DropEntryForm::template());
    }
}

/// Condition field grid shared by condition, anticondition and
/// multiplier conditions.
fn condition_ui(ui: &mut egui::Ui, form: &mut ConditionForm, salt: u64) {
    ui.horizontal(|ui| {
        ui.label("Time range:");
        egui::ComboBox::from_id_salt((salt, "time_range"))
            .selected_text(form.time_range.label())
            .show_ui(ui, |ui| {
                for range in TimeRange::all() {
                    ui.selectable_value(&mut form.time_range, *range, range.label());
                }
            });
        ui.label("Moon phase:");
        egui::ComboBox::from_id_salt((salt, "moon_phase"))
            .selected_text(form.moon_phase.label())
            .show_ui(ui, |ui| {
                for phase in MoonPhase::all() {
                    ui.selectable_value(&mut form.moon_phase, *phase, phase.label());
                }
            });
    });

    ui.horizontal_wrapped(|ui| {
        for (i, field) in CONDITION_BOOL_FIELDS.iter().enumerate() {
            ui.checkbox(&mut form.flags[i], *field);
        }
    });

    egui::Grid::new((salt, "int_fields"))
        .num_columns(8)
        .spacing([8.0, 2.0])
        .show(ui, |ui| {
            for (i, field) in CONDITION_INT_FIELDS.iter().enumerate() {
                ui.label(*field);
                ui.add(egui::TextEdit::singleline(&mut form.ints[i].text).desired_width(55.0));
                if (i + 1) % 4 == 0 {
                    ui.end_row();
                }
            }
        });

    for (i, field) in CONDITION_LIST_FIELDS.iter().enumerate() {
        ui.label(format!("{} (one per line):", field));
        ui.add(
            egui::TextEdit::multiline(&mut form.lists[i])
                .desired_rows(2)
                .desired_width(f32::INFINITY),
        );
    }

    ui.horizontal(|ui| {
        for (i, field) in CONDITION_STRING_FIELDS.iter().enumerate() {
            ui.label(format!("{}:", field));
            ui.add(egui::TextEdit::singleline(&mut form.strings[i]).desired_width(90.0));
        }
    });
}

/// Launch the desktop editor.
pub fn run(store: SpawnFileStore) -> Result<(), eframe::Error> {
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default().with_inner_size([1200.0, 800.0]),
        ..Default::default()
    };
    eframe::run_native(
        "Spawn Editor",
        options,
        Box::new(move |_cc| Ok(Box::new(EditorApp::new(store)))),
    )
}
