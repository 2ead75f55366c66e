use tokio::runtime::Handle;
use tokio::sync::mpsc::UnboundedSender;
use tracing::debug;

use crate::api::ApiClient;
use crate::app::{Command, Envelope, Reply, Request};

/// Runs requests on the tokio runtime and posts each reply back to the UI
/// thread. Requests are independent: no de-duplication, no cancellation.
#[derive(Clone)]
pub struct Dispatcher {
    client: ApiClient,
    runtime: Handle,
    replies: UnboundedSender<Envelope>,
}

impl Dispatcher {
    pub fn new(client: ApiClient, runtime: Handle, replies: UnboundedSender<Envelope>) -> Self {
        Self {
            client,
            runtime,
            replies,
        }
    }

    pub fn dispatch(&self, command: Command) {
        let client = self.client.clone();
        let replies = self.replies.clone();
        self.runtime.spawn(async move {
            let Command {
                generation,
                request,
            } = command;
            let reply = perform(&client, request).await;
            if replies.send(Envelope { generation, reply }).is_err() {
                debug!("UI has shut down; reply dropped");
            }
        });
    }
}

pub async fn perform(client: &ApiClient, request: Request) -> Reply {
    match request {
        Request::ProbeSession => Reply::Session(client.probe_session().await),
        Request::ListTasks => Reply::Tasks(client.list_tasks().await),
        Request::TaskDetail(id) => Reply::TaskDetail(client.task(id).await),
        Request::CreateTask(draft) => Reply::Created(client.create_task(&draft).await),
        Request::MyTasks => Reply::MyTasks(client.my_tasks().await),
        Request::DeleteTask(id) => Reply::Deleted(id, client.delete_task(id).await),
        Request::Account => Reply::Account(client.current_user().await),
        Request::Login(credentials) => Reply::LoggedIn(client.login(&credentials).await),
        Request::Register(registration) => Reply::Registered(client.register(&registration).await),
        Request::Logout => Reply::LoggedOut(client.logout().await),
    }
}
