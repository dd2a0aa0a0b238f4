//! Tileworld soak runner
//!
//! Drives a world through a long random sequence of placements, merges,
//! splits, container moves and disposals, checking the engine's internal
//! consistency after every tick.

use std::path::PathBuf;
use std::process::ExitCode;
use std::rc::Rc;

use clap::Parser;
use log::{LevelFilter, Log, Metadata, Record};

use tw_core::consts::SIZEOFFREE;
use tw_core::object::{Archetype, FreeFlags, ObjectRef};
use tw_core::{GameRng, InsertFlags, MapId, Object, ObjectId, ObjectType, Settings, TileMap, World};

/// Randomized consistency run for the object engine
#[derive(Parser, Debug)]
#[command(name = "tileworld-soak")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Seed for the world's random number generator (random if omitted)
    #[arg(short = 's', long = "seed")]
    seed: Option<u64>,

    /// Number of ticks to run
    #[arg(short = 't', long = "ticks", default_value_t = 10_000)]
    ticks: u64,

    /// Map width and height
    #[arg(long = "size", default_value_t = 12)]
    size: i32,

    /// JSON settings file
    #[arg(short = 'c', long = "settings")]
    settings: Option<PathBuf>,

    /// Increase log output (repeatable)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    verbose: u8,
}

/// Writes records to stderr
struct StderrLogger {
    level: LevelFilter,
}

impl Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            eprintln!("{:<5} {}: {}", record.level(), record.target(), record.args());
        }
    }

    fn flush(&self) {}
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    let logger = Box::new(StderrLogger { level });
    if log::set_boxed_logger(logger).is_ok() {
        log::set_max_level(level);
    }
}

/// One kind of random step
#[derive(Debug, Clone, Copy)]
enum Step {
    Drop,
    Split,
    Stow,
    Unstow,
    Destroy,
    Haste,
    Scatter,
}

const STEPS: [Step; 7] = [
    Step::Drop,
    Step::Split,
    Step::Stow,
    Step::Unstow,
    Step::Destroy,
    Step::Haste,
    Step::Scatter,
];

/// The world under test and the handles the runner still holds
struct Soak {
    world: World,
    map: MapId,
    kinds: Vec<Rc<Archetype>>,
    chests: Vec<ObjectRef>,
    loose: Vec<ObjectRef>,
}

impl Soak {
    fn new(settings: Settings, rng: GameRng, size: i32) -> Self {
        let mut world = World::new(settings, rng);
        let map = world.add_map(TileMap::new("soak", size, size));

        let mut kinds = Vec::new();
        for (name, type_, weight) in [
            ("arrow", ObjectType::Arrow, 10),
            ("gem", ObjectType::Gem, 3),
            ("scroll", ObjectType::Scroll, 20),
        ] {
            let mut clone = Object::blank();
            clone.type_ = type_;
            clone.weight = weight;
            clone.nrof = 1;
            clone.name = Some(world.strings.intern(name));
            let name = world.strings.intern(name);
            kinds.push(world.archetypes.add(Archetype::new(name, clone)));
        }

        let mut soak = Soak {
            world,
            map,
            kinds,
            chests: Vec::new(),
            loose: Vec::new(),
        };
        for reduction in [0, 50] {
            if let Some(chest) = soak.place_chest(reduction) {
                soak.chests.push(chest);
            }
        }
        soak
    }

    fn place_chest(&mut self, reduction: i8) -> Option<ObjectRef> {
        let chest = self.world.object_new();
        {
            let ob = self.world.obj_mut(chest);
            ob.type_ = ObjectType::Container;
            ob.weight = 100;
            ob.stats.str = reduction;
        }
        let (x, y) = self.random_tile();
        match self.world.insert_in_map_at(chest, self.map, None, InsertFlags::empty(), x, y) {
            Ok(Some(id)) => Some(self.world.object_ref(id)),
            _ => None,
        }
    }

    fn random_tile(&mut self) -> (i32, i32) {
        let size = self.world.map(self.map).width as u32;
        let x = self.world.rng.rn2(size) as i32;
        let y = self.world.rng.rn2(size) as i32;
        (x, y)
    }

    /// Drop handles whose objects are gone and pick a live one.
    fn pick(&mut self, from_chests: bool) -> Option<ObjectId> {
        let world = &self.world;
        let list = if from_chests { &mut self.chests } else { &mut self.loose };
        list.retain(|r| world.resolve(*r).is_some());
        if list.is_empty() {
            return None;
        }
        let r = list[self.world.rng.index(list.len())];
        self.world.resolve(r)
    }

    fn step(&mut self, step: Step) -> tw_core::world::Result<()> {
        log::trace!("step {step:?}");
        match step {
            Step::Drop => {
                let kind = self.kinds[self.world.rng.index(self.kinds.len())].clone();
                let item = self.world.arch_to_object(&kind);
                let nrof = 1 + self.world.rng.rn2(5);
                self.world.obj_mut(item).nrof = nrof;
                let (x, y) = self.random_tile();
                if let Some(kept) = self.world.insert_in_map_at(item, self.map, None, InsertFlags::empty(), x, y)? {
                    self.loose.push(self.world.object_ref(kept));
                }
            }
            Step::Split => {
                let Some(stack) = self.pick(false) else {
                    return Ok(());
                };
                let nrof = self.world.obj(stack).nrof;
                if nrof < 2 {
                    return Ok(());
                }
                let take = 1 + self.world.rng.rn2(nrof - 1);
                let part = self.world.split(stack, take)?;
                let (x, y) = (self.world.obj(stack).x, self.world.obj(stack).y);
                match self.world.obj(stack).links.map {
                    Some(map) => {
                        if let Some(placed) = self.world.insert_to_free_spot_or_free(part, map, x, y, 1, SIZEOFFREE, None)? {
                            self.loose.push(self.world.object_ref(placed));
                        }
                    }
                    None => self.world.free(part, FreeFlags::empty())?,
                }
            }
            Step::Stow => {
                let (Some(item), Some(chest)) = (self.pick(false), self.pick(true)) else {
                    return Ok(());
                };
                if self.world.obj(item).links.env.is_some() {
                    return Ok(());
                }
                self.world.remove(item)?;
                let kept = self.world.insert_in_container(item, chest)?;
                self.loose.push(self.world.object_ref(kept));
            }
            Step::Unstow => {
                let Some(chest) = self.pick(true) else {
                    return Ok(());
                };
                let Some(item) = self.world.obj(chest).links.inv else {
                    return Ok(());
                };
                self.world.remove(item)?;
                let (x, y) = self.random_tile();
                if let Some(kept) = self.world.insert_in_map_at(item, self.map, None, InsertFlags::empty(), x, y)? {
                    self.loose.push(self.world.object_ref(kept));
                }
            }
            Step::Destroy => {
                let Some(item) = self.pick(false) else {
                    return Ok(());
                };
                self.world.remove(item)?;
                self.world.free(item, FreeFlags::empty())?;
            }
            Step::Haste => {
                let Some(item) = self.pick(false) else {
                    return Ok(());
                };
                let speed = match self.world.rng.rn2(3) {
                    0 => 0.0,
                    1 => 0.5,
                    _ => -0.25,
                };
                self.world.set_speed(item, speed);
            }
            Step::Scatter => {
                let (x, y) = self.random_tile();
                match self.world.find_free_spot(None, self.map, x, y, 0, SIZEOFFREE) {
                    Some(i) => log::trace!("free spot around ({x},{y}) at ring index {i}"),
                    None => log::debug!("no free spot around ({x},{y})"),
                }
            }
        }
        Ok(())
    }
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.verbose);

    let settings = match &args.settings {
        Some(path) => match Settings::load_from_file(path) {
            Ok(s) => s,
            Err(e) => {
                log::error!("could not load {}: {e}", path.display());
                return ExitCode::FAILURE;
            }
        },
        None => Settings::default(),
    };
    if args.size < 2 {
        log::error!("map size must be at least 2");
        return ExitCode::FAILURE;
    }

    let rng = args.seed.map_or_else(GameRng::from_entropy, GameRng::new);
    let seed = rng.seed();
    let mut soak = Soak::new(settings, rng, args.size);
    log::info!("soak run: seed {seed} for {} ticks", args.ticks);

    let mut errors = 0u64;
    for tick in 0..args.ticks {
        let step = STEPS[soak.world.rng.index(STEPS.len())];
        if let Err(e) = soak.step(step) {
            log::warn!("tick {tick}: {step:?} failed: {e}");
            errors += 1;
        }
        if let Err(e) = soak.world.check_integrity() {
            log::error!("tick {tick}: integrity check failed after {step:?}: {e}");
            soak.world.dump_all();
            return ExitCode::FAILURE;
        }
    }

    let world = &soak.world;
    let report = serde_json::json!({
        "seed": seed,
        "ticks": args.ticks,
        "step_errors": errors,
        "used": world.objects.count_used(),
        "free": world.objects.count_free(),
        "active": world.objects.count_active(),
        "capacity": world.objects.capacity(),
        "spell_merges": world.stats.spell_merges,
        "spell_hash_full": world.stats.spell_hash_full,
    });
    match serde_json::to_string_pretty(&report) {
        Ok(text) => println!("{text}"),
        Err(e) => log::error!("could not format report: {e}"),
    }
    ExitCode::SUCCESS
}
