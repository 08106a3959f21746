//! End-to-end scenarios driving the director and state stack together:
//! FIFO ordering, clear completeness, the documented "overtaken caller"
//! behavior, and supervisor switch sequencing.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::Notify;

use statevisor::{
    Bus, Config, ContextRegistry, Director, StackAction, State, StateError, StateRef, StateStack,
    Supervisor, SupervisorError,
};

type Journal = Arc<Mutex<Vec<String>>>;

fn journal() -> Journal {
    Arc::new(Mutex::new(Vec::new()))
}

fn entries(journal: &Journal) -> Vec<String> {
    journal.lock().unwrap().clone()
}

fn record(journal: &Journal, entry: impl Into<String>) {
    journal.lock().unwrap().push(entry.into());
}

/// Records every hook invocation into a shared journal.
struct Probe {
    name: &'static str,
    journal: Journal,
}

impl Probe {
    fn arc(name: &'static str, journal: &Journal) -> Arc<Self> {
        Arc::new(Self {
            name,
            journal: Arc::clone(journal),
        })
    }
}

#[async_trait]
impl State for Probe {
    fn name(&self) -> &str {
        self.name
    }

    async fn enter(&self, _ctx: &ContextRegistry) -> Result<(), StateError> {
        record(&self.journal, format!("{}.enter", self.name));
        Ok(())
    }

    async fn exit(&self) -> Result<(), StateError> {
        record(&self.journal, format!("{}.exit", self.name));
        Ok(())
    }
}

fn stack_with(cfg: &Config) -> StateStack {
    StateStack::new(ContextRegistry::empty(), Bus::new(cfg.bus_capacity), cfg)
}

/// No state may receive a second enter without an intervening exit.
///
/// A state covered by a push legitimately exits more than it enters (once
/// when it is covered, once more when the stack is torn down), so only
/// enter-after-enter is a violation.
fn assert_no_double_enter(journal: &Journal) {
    let entries = entries(journal);
    let mut entered: Vec<&str> = Vec::new();

    for entry in &entries {
        let Some((name, hook)) = entry.split_once('.') else {
            panic!("malformed journal entry: {entry}");
        };
        if hook == "enter" {
            assert!(
                !entered.contains(&name),
                "state '{name}' entered twice without an exit: {entries:?}"
            );
            entered.push(name);
        } else {
            entered.retain(|n| *n != name);
        }
    }
}

#[tokio::test(flavor = "current_thread")]
async fn end_to_end_push_replace_clear() {
    let cfg = Config::default();
    let j = journal();
    let stack = stack_with(&cfg);

    stack.push(Probe::arc("a", &j)).await.unwrap();
    assert_eq!(stack.depth(), 1);

    stack.push(Probe::arc("b", &j)).await.unwrap();
    assert_eq!(stack.depth(), 2);

    stack
        .change(Probe::arc("c", &j), StackAction::ReplaceTop)
        .await
        .unwrap();
    assert_eq!(stack.depth(), 2);

    stack.clear().await.unwrap();
    assert_eq!(stack.depth(), 0);

    assert_eq!(
        entries(&j),
        [
            "a.enter", "a.exit", "b.enter", // push a, push b
            "b.exit", "c.enter", // replace b with c
            "c.exit", "a.exit", // clear: one exit per stacked state
        ]
    );
    assert_no_double_enter(&j);
}

/// A state that pushes further states from inside its own enter hook, using
/// the fire-and-forget surface (the only legal form there).
struct PushesOnEnter {
    name: &'static str,
    journal: Journal,
    stack: StateStack,
    children: Vec<StateRef>,
}

#[async_trait]
impl State for PushesOnEnter {
    fn name(&self) -> &str {
        self.name
    }

    async fn enter(&self, _ctx: &ContextRegistry) -> Result<(), StateError> {
        record(&self.journal, format!("{}.enter", self.name));
        for child in &self.children {
            self.stack.request_push(Arc::clone(child));
        }
        Ok(())
    }

    async fn exit(&self) -> Result<(), StateError> {
        record(&self.journal, format!("{}.exit", self.name));
        Ok(())
    }
}

#[tokio::test(flavor = "current_thread")]
async fn requests_from_inside_enter_are_served_fifo() {
    let cfg = Config::default();
    let j = journal();
    let stack = stack_with(&cfg);

    let root = Arc::new(PushesOnEnter {
        name: "root",
        journal: Arc::clone(&j),
        stack: stack.clone(),
        children: vec![Probe::arc("b", &j), Probe::arc("c", &j)],
    });

    // The awaiting caller is released only once the queue it joined has
    // fully drained, so both nested pushes have run by the time this returns.
    stack.push(root).await.unwrap();

    assert_eq!(stack.depth(), 3);
    assert_eq!(stack.current_state().as_deref(), Some("c"));
    assert_eq!(
        entries(&j),
        ["root.enter", "root.exit", "b.enter", "b.exit", "c.enter"]
    );
    assert_no_double_enter(&j);
}

/// A probe whose enter parks on a gate, keeping the transition in flight
/// until the test releases it.
struct Gated {
    name: &'static str,
    journal: Journal,
    gate: Arc<Notify>,
}

#[async_trait]
impl State for Gated {
    fn name(&self) -> &str {
        self.name
    }

    async fn enter(&self, _ctx: &ContextRegistry) -> Result<(), StateError> {
        record(&self.journal, format!("{}.enter", self.name));
        self.gate.notified().await;
        Ok(())
    }

    async fn exit(&self) -> Result<(), StateError> {
        record(&self.journal, format!("{}.exit", self.name));
        Ok(())
    }
}

#[tokio::test(flavor = "current_thread")]
async fn overtaken_caller_lands_on_a_later_state() {
    let cfg = Config::default();
    let j = journal();
    let stack = stack_with(&cfg);
    let gate = Arc::new(Notify::new());

    // R1: starts immediately; its enter parks on the gate.
    let r1 = {
        let stack = stack.clone();
        let state = Arc::new(Gated {
            name: "a",
            journal: Arc::clone(&j),
            gate: Arc::clone(&gate),
        });
        tokio::spawn(async move { stack.push(state).await })
    };
    while !stack.is_transitioning() {
        tokio::task::yield_now().await;
    }

    // R2: queued behind R1; its caller awaits the drain.
    let r2 = {
        let stack = stack.clone();
        let state = Probe::arc("b", &j);
        tokio::spawn(async move { stack.push(state).await })
    };
    for _ in 0..4 {
        tokio::task::yield_now().await;
    }

    // R3: queued behind R2; tears the whole stack down and pushes "c".
    stack.request_set(Probe::arc("c", &j));

    gate.notify_one();
    r1.await.unwrap().unwrap();
    r2.await.unwrap().unwrap();

    // FIFO: R2 fully completed (b entered) before R3 started; the R2 caller
    // was still released only at drain end, by which time "b" was gone.
    assert_eq!(
        entries(&j),
        [
            "a.enter", // R1 in flight
            "a.exit", "b.enter", // R2
            "b.exit", "a.exit", "c.enter", // R3: clear-and-push
        ]
    );
    assert_eq!(stack.depth(), 1);
    assert_eq!(stack.current_state().as_deref(), Some("c"));
    assert_no_double_enter(&j);
}

#[tokio::test(flavor = "current_thread")]
async fn mixed_request_sequence_keeps_depth_bookkeeping() {
    let cfg = Config::default();
    let j = journal();
    let stack = stack_with(&cfg);

    stack.push(Probe::arc("a", &j)).await.unwrap();
    stack.push(Probe::arc("b", &j)).await.unwrap();
    stack.push(Probe::arc("c", &j)).await.unwrap();
    stack.pop(1).await.unwrap();
    stack
        .change(Probe::arc("d", &j), StackAction::ReplaceTop)
        .await
        .unwrap();
    stack.push(Probe::arc("e", &j)).await.unwrap();
    stack.pop(2).await.unwrap();
    stack.reenter_current().await.unwrap();

    // pushes: a b c d e (5), pops: c (1), replace removed b (1), pop(2) (2)
    assert_eq!(stack.depth(), 1);
    assert_eq!(stack.current_state().as_deref(), Some("a"));
    assert_no_double_enter(&j);
}

/// A supervisor that builds a stack during load and seeds it with probes.
struct ProbeSupervisor {
    name: &'static str,
    bus: Bus,
    cfg: Config,
    journal: Journal,
    initial: Vec<&'static str>,
    stack: Mutex<Option<StateStack>>,
}

impl ProbeSupervisor {
    fn arc(
        name: &'static str,
        director: &Director,
        journal: &Journal,
        initial: Vec<&'static str>,
    ) -> Arc<Self> {
        Arc::new(Self {
            name,
            bus: director.bus(),
            cfg: director.config().clone(),
            journal: Arc::clone(journal),
            initial,
            stack: Mutex::new(None),
        })
    }
}

#[async_trait]
impl Supervisor for ProbeSupervisor {
    fn name(&self) -> &str {
        self.name
    }

    async fn load(&self, ctx: &ContextRegistry) -> Result<(), SupervisorError> {
        record(&self.journal, format!("{}.load", self.name));
        let stack = StateStack::new(ctx.clone(), self.bus.clone(), &self.cfg);
        for name in &self.initial {
            stack
                .push(Probe::arc(name, &self.journal))
                .await
                .map_err(|e| SupervisorError::load(self.name, e.as_message()))?;
        }
        *self.stack.lock().unwrap() = Some(stack);
        Ok(())
    }

    async fn unload(&self) -> Result<(), SupervisorError> {
        record(&self.journal, format!("{}.unload", self.name));
        self.stack.lock().unwrap().take();
        Ok(())
    }

    fn stack(&self) -> Option<StateStack> {
        self.stack.lock().unwrap().clone()
    }
}

#[tokio::test(flavor = "current_thread")]
async fn switch_drains_stack_then_unloads_then_loads() {
    let j = journal();
    let director = Director::new(Config::default(), Vec::new());

    let x = ProbeSupervisor::arc("x", &director, &j, vec!["s1", "s2"]);
    director.switch_to(x).await.unwrap();
    assert_eq!(director.current_state().as_deref(), Some("s2"));
    j.lock().unwrap().clear();

    let y = ProbeSupervisor::arc("y", &director, &j, vec![]);
    director.switch_to(y).await.unwrap();

    // Exact teardown/bring-up order: top-down exits, then unload, then load.
    assert_eq!(entries(&j), ["s2.exit", "s1.exit", "x.unload", "y.load"]);
    assert_eq!(director.current_supervisor().as_deref(), Some("y"));
    assert_eq!(director.current_state(), None);
}

#[tokio::test(flavor = "current_thread")]
async fn states_pull_dependencies_from_the_game_context() {
    struct Difficulty {
        level: u8,
    }

    struct ReadsDifficulty {
        seen: Arc<Mutex<Option<u8>>>,
    }

    #[async_trait]
    impl State for ReadsDifficulty {
        fn name(&self) -> &str {
            "reads-difficulty"
        }

        async fn enter(&self, ctx: &ContextRegistry) -> Result<(), StateError> {
            let difficulty = ctx.require::<Difficulty>()?;
            *self.seen.lock().unwrap() = Some(difficulty.level);
            Ok(())
        }

        async fn exit(&self) -> Result<(), StateError> {
            Ok(())
        }
    }

    let j = journal();
    let director = Director::new(Config::default(), Vec::new());
    director.set_context(
        ContextRegistry::builder()
            .with(Difficulty { level: 3 })
            .build(),
    );

    let hub = ProbeSupervisor::arc("hub", &director, &j, vec![]);
    director.switch_to(hub).await.unwrap();

    let seen = Arc::new(Mutex::new(None));
    director
        .push_state(Arc::new(ReadsDifficulty {
            seen: Arc::clone(&seen),
        }))
        .await
        .unwrap();

    assert_eq!(*seen.lock().unwrap(), Some(3));
}
