use std::net::SocketAddr;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, DuplexStream, ReadHalf, WriteHalf};
use tokio::net::TcpStream;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use ftplet_server::auth::{ConcurrentLoginPermission, InMemoryUserManager};
use ftplet_server::config::{ServerConfig, UserConfig};
use ftplet_server::error::FtpletError;
use ftplet_server::ftplet::traits::HookResult;
use ftplet_server::session::{SessionServices, handle_session};
use ftplet_server::stats::ServerStatistics;
use ftplet_server::{
    Ftplet, FtpletContainer, FtpletContext, FtpletResult, FtpReply, FtpRequest, FtpSession, Server,
};

type Calls = Arc<Mutex<Vec<String>>>;

/// Records hooks as "<label>:<event>" and can veto deletes.
struct Recorder {
    label: &'static str,
    calls: Calls,
    veto_delete: bool,
}

impl Recorder {
    fn new(label: &'static str, calls: &Calls) -> Self {
        Self {
            label,
            calls: Arc::clone(calls),
            veto_delete: false,
        }
    }

    fn push(&self, event: &str) {
        self.calls.lock().push(format!("{}:{}", self.label, event));
    }
}

#[async_trait]
impl Ftplet for Recorder {
    async fn on_connect(&self, _session: &mut FtpSession) -> HookResult {
        self.push("connect");
        Ok(FtpletResult::Continue)
    }

    async fn on_disconnect(&self, _session: &mut FtpSession) -> HookResult {
        self.push("disconnect");
        Ok(FtpletResult::Continue)
    }

    async fn on_login(&self, session: &mut FtpSession, _request: &FtpRequest) -> HookResult {
        self.push(if session.is_logged_in() { "login" } else { "login-failed" });
        Ok(FtpletResult::Continue)
    }

    async fn on_delete_start(&self, session: &mut FtpSession, _request: &FtpRequest) -> HookResult {
        self.push("delete_start");
        if self.veto_delete {
            session.write(FtpReply::new(550, "Deletion vetoed."));
            return Ok(FtpletResult::Skip);
        }
        Ok(FtpletResult::Continue)
    }

    async fn on_delete_end(&self, _session: &mut FtpSession, _request: &FtpRequest) -> HookResult {
        self.push("delete_end");
        Ok(FtpletResult::Continue)
    }
}

/// Turns away every connection with its own reply.
struct Gatekeeper;

#[async_trait]
impl Ftplet for Gatekeeper {
    async fn on_connect(&self, session: &mut FtpSession) -> HookResult {
        session.write(FtpReply::new(421, "Server closed for maintenance."));
        Ok(FtpletResult::Disconnect)
    }
}

/// Lets the rest of the chain see nothing of a connection.
struct Silencer;

#[async_trait]
impl Ftplet for Silencer {
    async fn on_connect(&self, _session: &mut FtpSession) -> HookResult {
        Ok(FtpletResult::Skip)
    }
}

/// Records lifecycle calls next to the hooks it sees.
struct Lifecycle {
    label: &'static str,
    calls: Calls,
    fail_init: bool,
}

impl Lifecycle {
    fn new(label: &'static str, calls: &Calls) -> Self {
        Self {
            label,
            calls: Arc::clone(calls),
            fail_init: false,
        }
    }

    fn push(&self, event: &str) {
        self.calls.lock().push(format!("{}:{}", self.label, event));
    }
}

#[async_trait]
impl Ftplet for Lifecycle {
    async fn init(&self, _context: &FtpletContext) -> Result<(), FtpletError> {
        self.push("init");
        if self.fail_init {
            return Err(FtpletError::failed("backing store offline"));
        }
        Ok(())
    }

    async fn destroy(&self) -> Result<(), FtpletError> {
        self.push("destroy");
        Ok(())
    }

    async fn on_disconnect(&self, _session: &mut FtpSession) -> HookResult {
        self.push("disconnect");
        Ok(FtpletResult::Continue)
    }

    async fn on_delete_start(&self, _session: &mut FtpSession, _request: &FtpRequest) -> HookResult {
        self.push("delete_start");
        Ok(FtpletResult::Continue)
    }
}

struct BrokenUpload;

#[async_trait]
impl Ftplet for BrokenUpload {
    async fn on_upload_start(&self, _session: &mut FtpSession, _request: &FtpRequest) -> HookResult {
        Err(FtpletError::failed("quota service unreachable"))
    }
}

struct Client {
    reader: BufReader<ReadHalf<DuplexStream>>,
    writer: WriteHalf<DuplexStream>,
    handle: JoinHandle<()>,
}

impl Client {
    fn connect(services: &Arc<SessionServices>, peer: &str, id: u64) -> Self {
        let (client, server) = tokio::io::duplex(4096);
        let peer: SocketAddr = peer.parse().unwrap();
        let handle = tokio::spawn(handle_session(server, peer, id, Arc::clone(services)));
        let (reader, writer) = tokio::io::split(client);
        Self {
            reader: BufReader::new(reader),
            writer,
            handle,
        }
    }

    /// Reads one complete (possibly multi-line) reply.
    async fn reply(&mut self) -> String {
        let mut reply = String::new();
        loop {
            let mut line = String::new();
            let n = self.reader.read_line(&mut line).await.unwrap();
            assert!(n > 0, "connection closed while reading reply: {reply:?}");
            reply.push_str(&line);
            let bytes = line.as_bytes();
            if bytes.len() >= 4 && bytes[..3].iter().all(u8::is_ascii_digit) && bytes[3] == b' ' {
                return reply;
            }
        }
    }

    async fn send(&mut self, line: &str) -> String {
        self.writer
            .write_all(format!("{line}\r\n").as_bytes())
            .await
            .unwrap();
        self.reply().await
    }

    async fn login(&mut self) -> String {
        assert!(self.send("USER alice").await.starts_with("331"));
        self.send("PASS alice123").await
    }

    async fn closed(mut self) {
        let mut rest = String::new();
        let n = self.reader.read_line(&mut rest).await.unwrap();
        assert_eq!(n, 0, "unexpected data: {rest:?}");
        self.handle.await.unwrap();
    }
}

fn services(container: Arc<FtpletContainer>, permission: ConcurrentLoginPermission) -> Arc<SessionServices> {
    let mut users = InMemoryUserManager::default();
    users.add_user("alice", "alice123");
    Arc::new(SessionServices::new(
        container,
        Arc::new(users),
        Arc::new(ServerStatistics::new()),
        permission,
        "Test server ready",
    ))
}

#[tokio::test]
async fn session_events_reach_ftplets_in_order() {
    let calls: Calls = Arc::new(Mutex::new(Vec::new()));
    let container = Arc::new(FtpletContainer::new());
    container.add_ftplet("a", Arc::new(Recorder::new("a", &calls))).await.unwrap();
    container.add_ftplet("b", Arc::new(Recorder::new("b", &calls))).await.unwrap();
    let services = services(container, ConcurrentLoginPermission::unlimited());

    let mut client = Client::connect(&services, "10.0.0.1:5000", 1);
    assert_eq!(client.reply().await, "220 Test server ready\r\n");
    assert_eq!(client.login().await, "230 User alice logged in.\r\n");
    assert_eq!(client.send("DELE old.txt").await, "502 Command not implemented.\r\n");
    assert_eq!(client.send("QUIT").await, "221 Goodbye.\r\n");
    client.closed().await;

    assert_eq!(
        *calls.lock(),
        vec![
            "a:connect",
            "b:connect",
            "a:login",
            "b:login",
            "a:delete_start",
            "b:delete_start",
            "a:delete_end",
            "b:delete_end",
            "a:disconnect",
            "b:disconnect",
        ]
    );
    assert_eq!(services.statistics().current_logins(), 0);
    assert_eq!(services.statistics().current_connections(), 0);
    assert_eq!(services.statistics().total_logins(), 1);
}

#[tokio::test]
async fn skip_replaces_the_base_command() {
    let calls: Calls = Arc::new(Mutex::new(Vec::new()));
    let mut veto = Recorder::new("a", &calls);
    veto.veto_delete = true;
    let container = Arc::new(FtpletContainer::new());
    container.add_ftplet("veto", Arc::new(veto)).await.unwrap();
    container.add_ftplet("b", Arc::new(Recorder::new("b", &calls))).await.unwrap();
    let services = services(container, ConcurrentLoginPermission::unlimited());

    let mut client = Client::connect(&services, "10.0.0.1:5000", 1);
    client.reply().await;
    client.login().await;
    calls.lock().clear();

    assert_eq!(client.send("DELE precious.txt").await, "550 Deletion vetoed.\r\n");
    assert_eq!(*calls.lock(), vec!["a:delete_start"]);

    assert_eq!(client.send("NOOP").await, "200 Command okay.\r\n");
    assert_eq!(client.send("QUIT").await, "221 Goodbye.\r\n");
    client.closed().await;
}

#[tokio::test]
async fn disconnect_on_connect_sends_reply_first() {
    let container = Arc::new(FtpletContainer::new());
    container.add_ftplet("gate", Arc::new(Gatekeeper)).await.unwrap();
    let services = services(container, ConcurrentLoginPermission::unlimited());

    let mut client = Client::connect(&services, "10.0.0.1:5000", 1);
    assert_eq!(client.reply().await, "421 Server closed for maintenance.\r\n");
    client.closed().await;
    assert_eq!(services.statistics().current_connections(), 0);
}

#[tokio::test]
async fn failed_before_hook_aborts_only_that_command() {
    let container = Arc::new(FtpletContainer::new());
    container.add_ftplet("quota", Arc::new(BrokenUpload)).await.unwrap();
    let services = services(container, ConcurrentLoginPermission::unlimited());

    let mut client = Client::connect(&services, "10.0.0.1:5000", 1);
    client.reply().await;
    client.login().await;
    assert_eq!(
        client.send("STOR big.iso").await,
        "451 Requested action aborted: local error in processing.\r\n"
    );
    assert_eq!(client.send("NOOP").await, "200 Command okay.\r\n");
    client.send("QUIT").await;
    client.closed().await;
}

#[tokio::test]
async fn per_address_limit_rejects_then_readmits() {
    let calls: Calls = Arc::new(Mutex::new(Vec::new()));
    let container = Arc::new(FtpletContainer::new());
    container.add_ftplet("a", Arc::new(Recorder::new("a", &calls))).await.unwrap();
    let services = services(container, ConcurrentLoginPermission::new(0, 1));

    let mut first = Client::connect(&services, "10.0.0.7:5000", 1);
    let mut second = Client::connect(&services, "10.0.0.7:5001", 2);
    let mut other = Client::connect(&services, "10.0.0.8:5000", 3);
    first.reply().await;
    second.reply().await;
    other.reply().await;

    assert!(first.login().await.starts_with("230"));
    assert_eq!(second.login().await, "530 Maximum login limit reached.\r\n");
    assert!(other.login().await.starts_with("230"));
    assert!(calls.lock().contains(&"a:login-failed".to_string()));

    first.send("QUIT").await;
    first.closed().await;
    assert_eq!(services.statistics().current_logins_from("10.0.0.7".parse().unwrap()), 0);

    assert!(second.send("PASS alice123").await.starts_with("230"));
    second.send("QUIT").await;
    second.closed().await;
    other.send("QUIT").await;
    other.closed().await;
    assert_eq!(services.statistics().current_logins(), 0);
}

#[tokio::test]
async fn protocol_edges() {
    let services = services(Arc::new(FtpletContainer::new()), ConcurrentLoginPermission::unlimited());

    let mut client = Client::connect(&services, "10.0.0.1:5000", 1);
    client.reply().await;
    assert_eq!(client.send("").await, "500 Syntax error, command unrecognized.\r\n");
    assert_eq!(client.send("XYZ").await, "530 Not logged in.\r\n");
    assert_eq!(
        client.send(&"A".repeat(600)).await,
        "500 Command too long.\r\n"
    );
    let help = client.send("HELP").await;
    assert!(help.starts_with("214-The following commands are recognized:\r\n"));
    assert!(help.ends_with("214 Help OK.\r\n"));
    client.send("QUIT").await;
    client.closed().await;
}

#[tokio::test]
async fn oversized_line_is_rejected_without_buffering_it() {
    let services = services(Arc::new(FtpletContainer::new()), ConcurrentLoginPermission::unlimited());

    let mut client = Client::connect(&services, "10.0.0.1:5000", 1);
    client.reply().await;
    assert_eq!(
        client.send(&"A".repeat(100_000)).await,
        "500 Command too long.\r\n"
    );
    assert_eq!(client.send("NOOP").await, "200 Command okay.\r\n");
    client.send("QUIT").await;
    client.closed().await;
}

#[tokio::test]
async fn skip_on_connect_still_greets() {
    let calls: Calls = Arc::new(Mutex::new(Vec::new()));
    let container = Arc::new(FtpletContainer::new());
    container.add_ftplet("quiet", Arc::new(Silencer)).await.unwrap();
    container.add_ftplet("a", Arc::new(Recorder::new("a", &calls))).await.unwrap();
    let services = services(container, ConcurrentLoginPermission::unlimited());

    let mut client = Client::connect(&services, "10.0.0.1:5000", 1);
    assert_eq!(client.reply().await, "220 Test server ready\r\n");
    assert!(calls.lock().is_empty());
    assert_eq!(client.send("NOOP").await, "200 Command okay.\r\n");
    client.send("QUIT").await;
    client.closed().await;
}

fn tcp_config() -> ServerConfig {
    ServerConfig {
        bind_address: "127.0.0.1".into(),
        control_port: 0,
        users: vec![UserConfig {
            name: "alice".into(),
            password: "alice123".into(),
        }],
        ..ServerConfig::default()
    }
}

#[tokio::test]
async fn shutdown_closes_sessions_before_destroying_ftplets() {
    let calls: Calls = Arc::new(Mutex::new(Vec::new()));
    let container = Arc::new(FtpletContainer::new());
    container.add_ftplet("a", Arc::new(Lifecycle::new("a", &calls))).await.unwrap();
    let server = Arc::new(Server::bind(tcp_config(), Arc::clone(&container)).await.unwrap());
    let addr = server.local_addr().unwrap();

    let (stop, stopped) = oneshot::channel::<()>();
    let running = {
        let server = Arc::clone(&server);
        tokio::spawn(async move {
            server
                .run_until(async {
                    let _ = stopped.await;
                })
                .await
        })
    };

    let stream = TcpStream::connect(addr).await.unwrap();
    let (reader, mut writer) = stream.into_split();
    let mut reader = BufReader::new(reader);
    let mut line = String::new();
    reader.read_line(&mut line).await.unwrap();
    assert!(line.starts_with("220"), "{line:?}");

    stop.send(()).unwrap();
    running.await.unwrap().unwrap();

    line.clear();
    reader.read_line(&mut line).await.unwrap();
    assert_eq!(line, "421 Server shutting down.\r\n");

    // commands after shutdown never reach a destroyed ftplet
    let _ = writer.write_all(b"DELE old.txt\r\n").await;
    line.clear();
    assert_eq!(reader.read_line(&mut line).await.unwrap_or(0), 0);

    assert_eq!(*calls.lock(), vec!["a:init", "a:disconnect", "a:destroy"]);
    assert!(container.is_empty().await);
    assert_eq!(server.statistics().current_connections(), 0);
}

#[tokio::test]
async fn failed_init_destroys_already_initialized_ftplets() {
    let calls: Calls = Arc::new(Mutex::new(Vec::new()));
    let mut broken = Lifecycle::new("b", &calls);
    broken.fail_init = true;
    let container = Arc::new(FtpletContainer::new());
    container.add_ftplet("a", Arc::new(Lifecycle::new("a", &calls))).await.unwrap();
    container.add_ftplet("b", Arc::new(broken)).await.unwrap();
    let server = Server::bind(tcp_config(), container).await.unwrap();

    assert!(server.run_until(std::future::pending::<()>()).await.is_err());
    assert_eq!(
        *calls.lock(),
        vec!["a:init", "b:init", "a:destroy", "b:destroy"]
    );
}

#[tokio::test]
async fn dropping_the_connection_still_disconnects() {
    let calls: Calls = Arc::new(Mutex::new(Vec::new()));
    let container = Arc::new(FtpletContainer::new());
    container.add_ftplet("a", Arc::new(Recorder::new("a", &calls))).await.unwrap();
    let services = services(container, ConcurrentLoginPermission::new(1, 0));

    let mut client = Client::connect(&services, "10.0.0.1:5000", 1);
    client.reply().await;
    client.login().await;
    assert_eq!(services.statistics().current_logins(), 1);

    let Client { reader, writer, handle } = client;
    drop(reader);
    drop(writer);
    handle.await.unwrap();

    assert_eq!(calls.lock().last().map(String::as_str), Some("a:disconnect"));
    assert_eq!(services.statistics().current_logins(), 0);
}
