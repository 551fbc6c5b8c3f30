/*
 Copyright (c) 2025 Mark Hughes

 This program is free software: you can redistribute it and/or modify
 it under the terms of the GNU Affero General Public License as published by
 the Free Software Foundation, either version 3 of the License, or
 (at your option) any later version.

 This program is distributed in the hope that it will be useful,
 but WITHOUT ANY WARRANTY; without even the implied warranty of
 MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
 GNU Affero General Public License for more details.

 You should have received a copy of the GNU Affero General Public License
 along with this program. If not, see <https://www.gnu.org/licenses/>.
*/
pub(crate) mod helpers;
pub(crate) mod static_files;

use std::io;
use std::time::Duration;

use actix_web::{
    dev::Service, middleware::Logger, web, web::Data, App, HttpServer,
};
use log::{debug, info};

use crate::StaticState;

pub const CONNECTION_TIMEOUT: u64 = 75;

/// Register the static asset handler for every GET and HEAD request
pub fn configure_static_service(cfg: &mut web::ServiceConfig, state: Data<StaticState>) {
    cfg.app_data(state).service(
        web::resource("/{path:.*}")
            .route(web::get().to(static_files::static_handler))
            .route(web::head().to(static_files::static_handler)),
    );
}

/// Run the server until it is stopped, listening on the configured host and port
pub async fn init_static_server(state: StaticState) -> io::Result<()> {
    let host = state.config.host.clone();
    let port = state.config.port;
    let state = Data::new(state);

    let server = HttpServer::new(move || {
        let state = state.clone();
        App::new()
            .wrap(Logger::default())
            .wrap_fn(|req, srv| {
                debug!("HttpRequest : {} {}", req.head().method, req.path());
                let fut = srv.call(req);
                async {
                    let res = fut.await?;
                    debug!("HttpResponse: {}", res.status());
                    Ok(res)
                }
            })
            .configure(move |cfg| configure_static_service(cfg, state))
    })
    .keep_alive(Duration::from_secs(CONNECTION_TIMEOUT));

    info!("mvstatic server listening on {host}:{port}");
    server.bind((host, port))?.run().await
}
