// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Everything handed to an end user after creation or rotation.

use keydesk_model::{Brigade, UserId};
use keydesk_seal::Plaintext;
use serde_json::json;

use crate::error::Result;
use crate::ipsec::IpsecClientConfig;
use crate::outline::OutlineClientConfig;
use crate::ovc::OvcClientConfig;
use crate::proto0::Proto0ClientConfig;
use crate::wireguard::WgClientConfig;

/// Client configs for every protocol the user has material for.
#[derive(Debug, Clone)]
pub struct ClientBundle {
	pub user_id: UserId,
	pub name: String,
	pub wg: WgClientConfig,
	pub ovc: Option<OvcClientConfig>,
	pub ipsec: Option<IpsecClientConfig>,
	pub outline: Option<OutlineClientConfig>,
	pub proto0: Option<Proto0ClientConfig>,
}

/// One rendered file of a bundle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundleFile {
	pub name: String,
	pub contents: Plaintext,
}

impl ClientBundle {
	/// Attach the certificate the router issued for this user's CSR.
	pub fn complete_ovc(&mut self, client_cert_pem: String) {
		if let Some(ovc) = self.ovc.as_mut() {
			ovc.complete(client_cert_pem);
		}
	}

	/// Render each client config as a named file. OVC files are skipped until
	/// the certificate has been attached.
	pub fn files(&self) -> Result<Vec<BundleFile>> {
		let stem = file_stem(&self.name);
		let mut files = vec![BundleFile {
			name: format!("{stem}.conf"),
			contents: self.wg.render(),
		}];

		if let Some(ovc) = self.ovc.as_ref().filter(|o| o.is_complete()) {
			files.push(BundleFile {
				name: format!("{stem}.ovpn"),
				contents: ovc.render_openvpn()?,
			});
			files.push(BundleFile {
				name: format!("{stem}-cloak.json"),
				contents: ovc.render_cloak()?,
			});
		}
		if let Some(ipsec) = &self.ipsec {
			files.push(BundleFile {
				name: format!("{stem}-ipsec.txt"),
				contents: ipsec.render(),
			});
		}
		if let Some(outline) = &self.outline {
			files.push(BundleFile {
				name: format!("{stem}-outline.txt"),
				contents: outline.access_key.clone(),
			});
		}
		if let Some(proto0) = &self.proto0 {
			files.push(BundleFile {
				name: format!("{stem}-proto0.txt"),
				contents: proto0.uri.clone(),
			});
		}
		Ok(files)
	}
}

fn file_stem(name: &str) -> String {
	name
		.chars()
		.map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
		.collect()
}

/// Amnezia-style JSON carrying the WireGuard config and, when present and
/// completed, the Cloak-wrapped OpenVPN profile.
pub fn amnezia(brigade: &Brigade, bundle: &ClientBundle) -> Result<Plaintext> {
	let mut containers = vec![json!({
		"container": "amnezia-wireguard",
		"wireguard": {
			"last_config": bundle.wg.render().expose_text(),
			"port": brigade.endpoint_port.to_string(),
			"transport_proto": "udp",
		},
	})];
	let mut default_container = "amnezia-wireguard";

	if let Some(ovc) = bundle.ovc.as_ref().filter(|o| o.is_complete()) {
		containers.push(json!({
			"container": "amnezia-openvpn-cloak",
			"cloak": {
				"last_config": serde_json::to_string(&ovc.cloak())?,
				"port": crate::ovc::OPENVPN_PORT.to_string(),
				"transport_proto": "tcp",
			},
			"openvpn": {
				"last_config": ovc.render_openvpn()?.expose_text(),
				"transport_proto": "tcp",
			},
		}));
		default_container = "amnezia-openvpn-cloak";
	}

	let doc = json!({
		"containers": containers,
		"defaultContainer": default_container,
		"description": bundle.name,
		"dns1": brigade.dns_v4.to_string(),
		"dns2": brigade.dns_v6.to_string(),
		"hostName": brigade.endpoint_host(),
	});
	Ok(Plaintext::from(serde_json::to_string_pretty(&doc)?))
}
