//! The trial runner: arranges the shelves for one participant's trial.
//!
//! STARTUP ORDER (fixed):
//!   1. Read ParticipantID / TrialNumber from preferences (default 1 / 1)
//!   2. Index the scene inventory (hides every product)
//!   3. Load the product table
//!   4. Load the trials table
//!   5. Run the current trial, if the trials table loaded
//!
//! RULES:
//!   - Nothing on the load/parse/run path fails the session. Bad rows are
//!     skipped, missing prices become 0, missing scene products get a
//!     sentinel label, a missing trial means the experiment is finished.
//!   - Only preference writes can return an error.
//!   - The sync and async start paths differ only in how CSV text arrives.

use crate::{
    config::RigConfig,
    csv_table,
    error::{RigError, RigResult},
    event::TrialEvent,
    inventory::SceneInventory,
    prefs::{PreferenceStore, PARTICIPANT_ID_KEY, TRIAL_NUMBER_KEY},
    price_index::PriceIndex,
    scene::SceneGraph,
    source::{AsyncTextSource, TextSource},
    trial_sequence::TrialSequence,
    types::{ObjectId, ParticipantId, ProductId, Shelves, TrialNumber, EMPTY_LABEL},
};

pub struct TrialRunner<S: SceneGraph, P: PreferenceStore> {
    pub participant_id: ParticipantId,
    pub trial_number:   TrialNumber,
    scene:              S,
    prefs:              P,
    shelves:            Shelves,
    config:             RigConfig,
    prices:             PriceIndex,
    trials:             TrialSequence,
    inventory:          SceneInventory,
    active:             Vec<ObjectId>,
}

impl<S: SceneGraph, P: PreferenceStore> TrialRunner<S, P> {
    /// Start with blocking CSV reads.
    pub fn start<T>(
        scene: S,
        prefs: P,
        shelves: Shelves,
        config: RigConfig,
        source: &T,
    ) -> (Self, Vec<TrialEvent>)
    where
        T: TextSource + ?Sized,
    {
        let (mut runner, mut events) = Self::indexed(scene, prefs, shelves, config);

        let products = source.fetch_text(&runner.config.products_csv_name);
        runner.load_products(products, &mut events);
        let trials = source.fetch_text(&runner.config.trials_csv_name);
        let loaded = runner.load_trials(trials, &mut events);

        runner.begin(loaded, &mut events);
        (runner, events)
    }

    /// Start with suspending CSV fetches. Same result as `start` once the
    /// fetches complete.
    pub async fn start_async<T>(
        scene: S,
        prefs: P,
        shelves: Shelves,
        config: RigConfig,
        source: &T,
    ) -> (Self, Vec<TrialEvent>)
    where
        T: AsyncTextSource + ?Sized,
    {
        let (mut runner, mut events) = Self::indexed(scene, prefs, shelves, config);

        let products = source.fetch_text(&runner.config.products_csv_name).await;
        runner.load_products(products, &mut events);
        let trials = source.fetch_text(&runner.config.trials_csv_name).await;
        let loaded = runner.load_trials(trials, &mut events);

        runner.begin(loaded, &mut events);
        (runner, events)
    }

    fn indexed(mut scene: S, prefs: P, shelves: Shelves, config: RigConfig) -> (Self, Vec<TrialEvent>) {
        let participant_id = prefs.get_int(PARTICIPANT_ID_KEY, 1);
        let trial_number = prefs.get_int(TRIAL_NUMBER_KEY, 1);
        log::info!("Initializing trial runner... P:{participant_id}, T:{trial_number}");

        let inventory = SceneInventory::build(&mut scene);
        let events = vec![TrialEvent::InventoryIndexed { products: inventory.len() }];

        let runner = Self {
            participant_id,
            trial_number,
            scene,
            prefs,
            shelves,
            config,
            prices: PriceIndex::default(),
            trials: TrialSequence::default(),
            inventory,
            active: Vec::new(),
        };
        (runner, events)
    }

    fn load_products(&mut self, fetched: RigResult<String>, events: &mut Vec<TrialEvent>) {
        match fetched {
            Ok(text) => {
                self.prices = PriceIndex::build(&csv_table::parse_products(&text));
                log::info!("Product DB loaded: {} prices defined.", self.prices.len());
                events.push(TrialEvent::ProductsLoaded { prices: self.prices.len() });
            }
            Err(e) => {
                log::error!("Product database not available: {e}");
                events.push(unavailable(&self.config.products_csv_name, &e));
            }
        }
    }

    fn load_trials(&mut self, fetched: RigResult<String>, events: &mut Vec<TrialEvent>) -> bool {
        match fetched {
            Ok(text) => {
                self.trials = TrialSequence::build(&csv_table::parse_trials(&text));
                for (p, t) in self.trials.duplicate_keys() {
                    log::warn!("Trials file defines participant {p} trial {t} more than once; using the first.");
                }
                log::info!("Trials loaded: {} trials queued.", self.trials.len());
                events.push(TrialEvent::TrialsLoaded { trials: self.trials.len() });
                true
            }
            Err(e) => {
                log::error!("Trials file not available: {e}");
                events.push(unavailable(&self.config.trials_csv_name, &e));
                false
            }
        }
    }

    fn begin(&mut self, trials_loaded: bool, events: &mut Vec<TrialEvent>) {
        if trials_loaded {
            let (p, t) = (self.participant_id, self.trial_number);
            events.extend(self.run_trial(p, t));
        }
    }

    /// Hide the previous trial's products and lay out trial `t` for participant `p`.
    /// Progress is left alone; only `advance` and `set_participant` move it.
    pub fn run_trial(&mut self, participant_id: ParticipantId, trial_number: TrialNumber) -> Vec<TrialEvent> {
        for obj in self.active.drain(..) {
            self.scene.set_active(obj, false);
        }

        let Some(record) = self.trials.find(participant_id, trial_number).cloned() else {
            log::info!(
                "No data found for participant {participant_id}, trial {trial_number}. Experiment finished?"
            );
            for shelf in self.shelves {
                if let Some(label) = shelf.label {
                    self.scene.set_label_text(label, EMPTY_LABEL);
                }
            }
            return vec![TrialEvent::ExperimentFinished { participant_id, trial_number }];
        };

        log::info!("Running trial {trial_number} for participant {participant_id}...");
        let mut events = vec![TrialEvent::TrialStarted { participant_id, trial_number }];
        for (shelf, product_id) in record.shelf_product_ids.into_iter().enumerate() {
            events.extend(self.place_product(product_id, shelf));
        }
        events
    }

    /// Put `product_id` on shelf number `shelf` and label it with its price.
    pub fn place_product(&mut self, product_id: ProductId, shelf: usize) -> Vec<TrialEvent> {
        let Some(slot) = self.shelves.get(shelf).copied() else {
            log::warn!("Shelf {shelf} does not exist; product {product_id} not placed.");
            return vec![];
        };

        let Some(obj) = self.inventory.lookup(product_id) else {
            log::error!(
                "CRITICAL: Trial asks for product {product_id}, but it is not in the scene inventory!"
            );
            if let Some(label) = slot.label {
                self.scene.set_label_text(label, &self.config.missing_label);
            }
            return vec![TrialEvent::ProductMissing { shelf, product_id }];
        };

        // Detach first so the shelf's scale is not inherited.
        self.scene.detach(obj);
        let pose = self.scene.world_pose(slot.anchor);
        self.scene.set_world_pose(obj, pose);
        self.scene.set_active(obj, true);
        if !self.active.contains(&obj) {
            self.active.push(obj);
        }

        let mut events = Vec::new();
        let price = match self.prices.get(product_id) {
            Some(price) => price,
            None => {
                log::warn!("Price missing for product {product_id}, defaulting to 0.");
                events.push(TrialEvent::PriceMissing { shelf, product_id });
                0.0
            }
        };

        let label_text = format!("{price:.2}");
        if let Some(label) = slot.label {
            self.scene.set_label_text(label, &label_text);
        }
        log::debug!("shelf={shelf} product={product_id} price={label_text}");
        events.push(TrialEvent::ProductPlaced { shelf, product_id, price, label: label_text });
        events
    }

    /// Move on to the next trial and remember it across restarts.
    pub fn advance(&mut self) -> RigResult<Vec<TrialEvent>> {
        let next = self.trial_number.saturating_add(1);
        self.prefs.set_int(TRIAL_NUMBER_KEY, next)?;
        self.prefs.flush()?;
        self.trial_number = next;

        let mut events = vec![TrialEvent::TrialAdvanced {
            participant_id: self.participant_id,
            trial_number:   next,
        }];
        events.extend(self.run_trial(self.participant_id, next));
        Ok(events)
    }

    /// Switch to another participant, starting again at trial 1.
    pub fn set_participant(&mut self, participant_id: ParticipantId) -> RigResult<Vec<TrialEvent>> {
        self.prefs.set_int(PARTICIPANT_ID_KEY, participant_id)?;
        self.prefs.set_int(TRIAL_NUMBER_KEY, 1)?;
        self.prefs.flush()?;
        self.participant_id = participant_id;
        self.trial_number = 1;

        let mut events = vec![TrialEvent::ParticipantChanged { participant_id }];
        events.extend(self.run_trial(participant_id, 1));
        Ok(events)
    }

    pub fn active_set(&self) -> &[ObjectId] { &self.active }
    pub fn shelves(&self) -> &Shelves { &self.shelves }
    pub fn prices(&self) -> &PriceIndex { &self.prices }
    pub fn trials(&self) -> &TrialSequence { &self.trials }
    pub fn inventory(&self) -> &SceneInventory { &self.inventory }
    pub fn scene(&self) -> &S { &self.scene }
    pub fn scene_mut(&mut self) -> &mut S { &mut self.scene }
    pub fn prefs(&self) -> &P { &self.prefs }

    pub fn into_parts(self) -> (S, P) {
        (self.scene, self.prefs)
    }
}

fn unavailable(name: &str, err: &RigError) -> TrialEvent {
    TrialEvent::SourceUnavailable { name: name.to_string(), reason: err.to_string() }
}
