use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::body::{Body, to_bytes};
use axum::extract::Request;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use userhub_routing::{
    Controller, HandlerChain, HttpMethod, InjectedMiddleware, Middleware, MiddlewareFactory,
    MiddlewareRegistry, Next, RouteSink, RouteTable, RoutingError, apply,
};

/// Records registrations instead of serving them.
#[derive(Default)]
struct RecordingSink {
    routes: Vec<(HttpMethod, String, HandlerChain)>,
}

impl RecordingSink {
    fn summary(&self) -> Vec<(HttpMethod, &str, Vec<&str>)> {
        self.routes
            .iter()
            .map(|(m, p, c)| (*m, p.as_str(), c.middleware_names()))
            .collect()
    }

    fn chain(&self, method: HttpMethod, path: &str) -> &HandlerChain {
        &self
            .routes
            .iter()
            .find(|(m, p, _)| *m == method && p == path)
            .expect("route not registered")
            .2
    }
}

impl RouteSink for RecordingSink {
    fn register(&mut self, method: HttpMethod, path: &str, chain: HandlerChain) {
        self.routes.push((method, path.to_string(), chain));
    }
}

type Trace = Arc<Mutex<Vec<String>>>;

fn tracing_mw(label: String, trace: Trace) -> Middleware {
    Middleware::from_fn(label.clone(), move |req, next: Next| {
        let trace = trace.clone();
        let label = label.clone();
        async move {
            trace.lock().unwrap().push(label);
            next.run(req).await
        }
    })
}

struct Fixture {
    registry: MiddlewareRegistry,
    trace: Trace,
    role_params: Arc<Mutex<Vec<Option<String>>>>,
}

fn fixture() -> Fixture {
    let trace: Trace = Arc::default();
    let role_params: Arc<Mutex<Vec<Option<String>>>> = Arc::default();

    let auth_trace = trace.clone();
    let role_trace = trace.clone();
    let request_id_trace = trace.clone();
    let seen = role_params.clone();

    let registry = MiddlewareRegistry::builder()
        .register(
            "auth",
            MiddlewareFactory::plain(move || tracing_mw("auth".into(), auth_trace.clone())),
        )
        .register(
            "role",
            MiddlewareFactory::new(move |param| {
                seen.lock().unwrap().push(param.map(str::to_string));
                tracing_mw(format!("role({})", param.unwrap_or("")), role_trace.clone())
            }),
        )
        .register(
            "requestId",
            MiddlewareFactory::plain(move || tracing_mw("requestId".into(), request_id_trace.clone())),
        )
        .build()
        .unwrap();

    Fixture {
        registry,
        trace,
        role_params,
    }
}

static CREATED: AtomicUsize = AtomicUsize::new(0);

struct UserController {
    serial: usize,
    trace: Trace,
}

impl UserController {
    async fn show(self: Arc<Self>, _req: Request) -> Response {
        self.trace.lock().unwrap().push(format!("show#{}", self.serial));
        (StatusCode::OK, "show").into_response()
    }

    async fn store(self: Arc<Self>, _req: Request) -> Response {
        self.trace.lock().unwrap().push(format!("store#{}", self.serial));
        (StatusCode::CREATED, "store").into_response()
    }
}

impl Controller for UserController {
    type Context = Trace;

    fn create(context: &Trace) -> anyhow::Result<Self> {
        Ok(Self {
            serial: CREATED.fetch_add(1, Ordering::SeqCst),
            trace: context.clone(),
        })
    }

    fn routes() -> Result<RouteTable<Self>, RoutingError> {
        let mut table = RouteTable::new();
        table.handler("show", Self::show).handler("store", Self::store);
        table.get("/user/:id", "show")?.middleware("show", ["auth"])?;
        table
            .middleware("store", ["auth", "role:admin"])?
            .post("/user", "store")?;
        Ok(table)
    }
}

fn request() -> Request {
    Request::builder().uri("/").body(Body::empty()).unwrap()
}

fn request_id(trace: Trace) -> InjectedMiddleware {
    tracing_mw("requestId".into(), trace).into()
}

#[tokio::test]
async fn declared_then_injected_then_handler() {
    let fx = fixture();
    let mut sink = RecordingSink::default();

    apply::<UserController, _>(&mut sink, &fx.trace, &fx.registry, &[request_id(fx.trace.clone())])
        .unwrap();

    assert_eq!(
        sink.summary(),
        vec![
            (HttpMethod::Get, "/user/:id", vec!["auth", "requestId"]),
            (HttpMethod::Post, "/user", vec!["auth", "role:admin", "requestId"]),
        ]
    );

    let res = sink.chain(HttpMethod::Post, "/user").call(request()).await;
    assert_eq!(res.status(), StatusCode::CREATED);
    let body = to_bytes(res.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&body[..], b"store");

    let trace = fx.trace.lock().unwrap().clone();
    assert_eq!(trace.len(), 4);
    assert_eq!(&trace[..3], ["auth", "role(admin)", "requestId"]);
    assert!(trace[3].starts_with("store#"));
}

#[test]
fn role_factory_receives_only_the_parameter() {
    let fx = fixture();
    let mut sink = RecordingSink::default();

    apply::<UserController, _>(&mut sink, &fx.trace, &fx.registry, &[]).unwrap();

    assert_eq!(*fx.role_params.lock().unwrap(), vec![Some("admin".to_string())]);
}

#[test]
fn injected_aliases_resolve_through_the_registry() {
    let fx = fixture();
    let mut sink = RecordingSink::default();

    apply::<UserController, _>(
        &mut sink,
        &fx.trace,
        &fx.registry,
        &["requestId".into(), "role:staff".into()],
    )
    .unwrap();

    assert_eq!(
        sink.chain(HttpMethod::Get, "/user/:id").middleware_names(),
        vec!["auth", "requestId", "role:staff"]
    );
}

#[test]
fn unknown_declared_alias_registers_nothing() {
    struct Ghostly;

    impl Ghostly {
        async fn ok(self: Arc<Self>, _req: Request) -> StatusCode {
            StatusCode::OK
        }
    }

    impl Controller for Ghostly {
        type Context = ();

        fn create(_: &()) -> anyhow::Result<Self> {
            Ok(Self)
        }

        fn routes() -> Result<RouteTable<Self>, RoutingError> {
            let mut table = RouteTable::new();
            table.handler("ok", Self::ok).handler("haunted", Self::ok);
            table.get("/fine", "ok")?;
            table.get("/haunted", "haunted")?.middleware("haunted", ["auth", "ghost"])?;
            Ok(table)
        }
    }

    let fx = fixture();
    let mut sink = RecordingSink::default();

    let err = apply::<Ghostly, _>(&mut sink, &(), &fx.registry, &[]).unwrap_err();

    assert!(matches!(err, RoutingError::MiddlewareNotFound { ref alias } if alias == "ghost"));
    assert!(sink.routes.is_empty());
}

#[test]
fn declaration_error_surfaces_before_instantiation() {
    static BUILT: AtomicUsize = AtomicUsize::new(0);

    struct Misdeclared;

    impl Misdeclared {
        async fn ok(self: Arc<Self>, _req: Request) -> StatusCode {
            StatusCode::OK
        }
    }

    impl Controller for Misdeclared {
        type Context = ();

        fn create(_: &()) -> anyhow::Result<Self> {
            BUILT.fetch_add(1, Ordering::SeqCst);
            Ok(Self)
        }

        fn routes() -> Result<RouteTable<Self>, RoutingError> {
            let mut table = RouteTable::new();
            table.handler("ok", Self::ok);
            table.get("/a", "ok")?;
            table.get("/b", "missing")?;
            Ok(table)
        }
    }

    let fx = fixture();
    let mut sink = RecordingSink::default();

    let err = apply::<Misdeclared, _>(&mut sink, &(), &fx.registry, &[]).unwrap_err();

    assert!(matches!(err, RoutingError::InvalidDecoratorTarget { ref method } if method == "missing"));
    assert!(sink.routes.is_empty());
    assert_eq!(BUILT.load(Ordering::SeqCst), 0);
}

#[test]
fn duplicate_route_fails_before_anything_is_mounted() {
    static BUILT: AtomicUsize = AtomicUsize::new(0);

    struct Doubled;

    impl Doubled {
        async fn ok(self: Arc<Self>, _req: Request) -> StatusCode {
            StatusCode::OK
        }
    }

    impl Controller for Doubled {
        type Context = ();

        fn create(_: &()) -> anyhow::Result<Self> {
            BUILT.fetch_add(1, Ordering::SeqCst);
            Ok(Self)
        }

        fn routes() -> Result<RouteTable<Self>, RoutingError> {
            let mut table = RouteTable::new();
            table.handler("first", Self::ok).handler("second", Self::ok);
            table.get("/user", "first")?;
            table.post("/user", "first")?;
            table.get("/user", "second")?;
            Ok(table)
        }
    }

    let fx = fixture();
    let mut sink = RecordingSink::default();

    let err = apply::<Doubled, _>(&mut sink, &(), &fx.registry, &[]).unwrap_err();

    assert!(matches!(
        err,
        RoutingError::DuplicateRoute { method: HttpMethod::Get, ref path } if path == "/user"
    ));
    assert!(sink.routes.is_empty());
    assert_eq!(BUILT.load(Ordering::SeqCst), 0);
}

#[test]
fn unknown_injected_alias_registers_nothing() {
    let fx = fixture();
    let mut sink = RecordingSink::default();

    let err = apply::<UserController, _>(&mut sink, &fx.trace, &fx.registry, &["ghost:x".into()])
        .unwrap_err();

    assert!(matches!(err, RoutingError::MiddlewareNotFound { ref alias } if alias == "ghost"));
    assert!(sink.routes.is_empty());
}

#[tokio::test]
async fn routes_without_middleware_are_registered_bare() {
    struct Plain;

    impl Plain {
        async fn ping(self: Arc<Self>, _req: Request) -> &'static str {
            "pong"
        }
    }

    impl Controller for Plain {
        type Context = ();

        fn create(_: &()) -> anyhow::Result<Self> {
            Ok(Self)
        }

        fn routes() -> Result<RouteTable<Self>, RoutingError> {
            let mut table = RouteTable::new();
            table.handler("ping", Self::ping);
            table.get("/ping", "ping")?;
            Ok(table)
        }
    }

    let fx = fixture();
    let mut sink = RecordingSink::default();
    apply::<Plain, _>(&mut sink, &(), &fx.registry, &[]).unwrap();

    let chain = sink.chain(HttpMethod::Get, "/ping");
    assert!(chain.is_bare());

    let res = chain.call(request()).await;
    let body = to_bytes(res.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&body[..], b"pong");
}

#[test]
fn empty_controller_is_a_no_op() {
    struct Empty;

    impl Controller for Empty {
        type Context = ();

        fn create(_: &()) -> anyhow::Result<Self> {
            Ok(Self)
        }

        fn routes() -> Result<RouteTable<Self>, RoutingError> {
            Ok(RouteTable::new())
        }
    }

    let fx = fixture();
    let mut sink = RecordingSink::default();
    apply::<Empty, _>(&mut sink, &(), &fx.registry, &[]).unwrap();
    assert!(sink.routes.is_empty());
}

#[test]
fn instantiation_failure_propagates() {
    struct Broken;

    impl Controller for Broken {
        type Context = ();

        fn create(_: &()) -> anyhow::Result<Self> {
            anyhow::bail!("database handle missing")
        }

        fn routes() -> Result<RouteTable<Self>, RoutingError> {
            Ok(RouteTable::new())
        }
    }

    let fx = fixture();
    let mut sink = RecordingSink::default();
    let err = apply::<Broken, _>(&mut sink, &(), &fx.registry, &[]).unwrap_err();

    match err {
        RoutingError::Instantiation { source, .. } => {
            assert_eq!(source.to_string(), "database handle missing");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn one_instance_serves_every_route_of_an_apply_call() {
    let fx = fixture();
    let mut sink = RecordingSink::default();
    apply::<UserController, _>(&mut sink, &fx.trace, &fx.registry, &[]).unwrap();

    sink.chain(HttpMethod::Get, "/user/:id").call(request()).await;
    sink.chain(HttpMethod::Get, "/user/:id").call(request()).await;
    sink.chain(HttpMethod::Post, "/user").call(request()).await;

    let serials: Vec<String> = fx
        .trace
        .lock()
        .unwrap()
        .iter()
        .filter_map(|t| t.split_once('#').map(|(_, serial)| serial.to_string()))
        .collect();

    assert_eq!(serials.len(), 3);
    assert!(serials.iter().all(|s| s == &serials[0]));
}

#[tokio::test]
async fn repeated_apply_keeps_injected_middleware_separate() {
    let fx = fixture();
    let mut first = RecordingSink::default();
    let mut second = RecordingSink::default();

    let a = tracing_mw("a".into(), fx.trace.clone());
    let b = tracing_mw("b".into(), fx.trace.clone());

    apply::<UserController, _>(&mut first, &fx.trace, &fx.registry, &[a.into()]).unwrap();
    apply::<UserController, _>(&mut second, &fx.trace, &fx.registry, &[b.into()]).unwrap();

    assert_eq!(
        first.chain(HttpMethod::Get, "/user/:id").middleware_names(),
        vec!["auth", "a"]
    );
    assert_eq!(
        second.chain(HttpMethod::Get, "/user/:id").middleware_names(),
        vec!["auth", "b"]
    );

    first.chain(HttpMethod::Get, "/user/:id").call(request()).await;
    second.chain(HttpMethod::Get, "/user/:id").call(request()).await;

    let trace = fx.trace.lock().unwrap().clone();
    let first_serial = trace[2].clone();
    let second_serial = trace[5].clone();
    assert_eq!(&trace[..2], ["auth", "a"]);
    assert_eq!(&trace[3..5], ["auth", "b"]);
    assert_ne!(first_serial, second_serial);
}
