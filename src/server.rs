//! TCP protocol server (§4.G). One task per connection: decode a command
//! frame, dispatch it to the `Controller`, and otherwise fall back to
//! streaming Stellarium position frames every ~500 ms while idle. Ported
//! from the source daemon's `handler.py::TelescopeRequestHandler.handle`.

use crate::controller::Controller;
use crate::motor::Direction;
use crate::protocol::{self, Command};
use chrono::Utc;
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::time::Duration;

const RECV_TIMEOUT: Duration = Duration::from_millis(10);
const IDLE_POLL_PERIOD: Duration = Duration::from_millis(500);

pub async fn run(listener: TcpListener, controller: Arc<Controller>) {
    loop {
        let (socket, peer) = match listener.accept().await {
            Ok(accepted) => accepted,
            Err(error) => {
                tracing::warn!(%error, "accept failed");
                continue;
            }
        };
        tracing::info!(%peer, "client connected");
        let controller = controller.clone();
        tokio::spawn(async move {
            handle_connection(socket, controller).await;
            tracing::info!(%peer, "client disconnected");
        });
    }
}

async fn handle_connection(mut socket: TcpStream, controller: Arc<Controller>) {
    let mut buf = [0u8; 160];
    loop {
        match tokio::time::timeout(RECV_TIMEOUT, socket.read(&mut buf)).await {
            Ok(Ok(0)) => return,
            Ok(Ok(n)) => match protocol::decode(&buf[..n]) {
                Ok(command) => {
                    let single_shot = command.is_single_shot();
                    dispatch(&controller, &mut socket, command).await;
                    if single_shot {
                        return;
                    }
                }
                Err(error) => {
                    tracing::warn!(%error, "malformed frame, closing connection");
                    return;
                }
            },
            Ok(Err(error)) => {
                tracing::debug!(%error, "read error");
                return;
            }
            Err(_timeout) => {
                let (ra_h, dec_deg) = controller.current_pos();
                let frame = protocol::encode_position(Utc::now().timestamp_micros(), ra_h, dec_deg, 0);
                if socket.write_all(&frame).await.is_err() {
                    return;
                }
                tokio::time::sleep(IDLE_POLL_PERIOD).await;
            }
        }
    }
}

async fn dispatch(controller: &Arc<Controller>, socket: &mut TcpStream, command: Command) {
    match command {
        Command::Stellarium {
            ra_uint, dec_int, ..
        } => {
            let (ra_h, dec_deg) = protocol::stellarium_to_radec(ra_uint, dec_int);
            controller.goto(ra_h, dec_deg).await;
        }
        Command::Location { lon, lat, alt } => {
            controller.set_observer(lon as f64, lat as f64, alt as f64);
        }
        Command::StartCal => controller.start_calibration().await,
        Command::StopCal => controller.stop_calibration(),
        Command::MakeStep {
            az_steps,
            alt_steps,
        } => controller.make_step(az_steps, alt_steps).await,
        Command::StartMot {
            motor_id,
            action,
            direction,
        } => {
            if let Ok(axis) = usize::try_from(motor_id) {
                let direction = Direction::from_positive(direction != 0);
                controller.start_stop_motor(axis, action != 0, direction).await;
            }
        }
        Command::SetAngle { object_id } => {
            if let Ok(id) = usize::try_from(object_id) {
                if let Err(error) = controller.set_object(id) {
                    tracing::debug!(%error, "cannot set controller to given object");
                }
            }
        }
        Command::ToggleTrack => controller.toggle_tracking().await,
        Command::ApplyObject => controller.apply_object(),
        Command::Status { code } => {
            let response = controller.get_status(code).await;
            if socket.write_all(response.as_bytes()).await.is_ok() {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        }
    }
}
