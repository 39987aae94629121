/*
 * Copyright Stalwart Labs Ltd. See the COPYING
 * file at the top-level directory of this distribution.
 *
 * Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
 * https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
 * <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
 * option. This file may not be copied, modified, or distributed
 * except according to those terms.
 */

use std::{
    borrow::Cow,
    collections::{BTreeMap, HashSet},
    fmt::Display,
};

use mail_builder::{
    headers::{address, HeaderType},
    MessageBuilder,
};

#[derive(Debug, Default)]
pub struct Message<'x> {
    pub mail_from: Address<'x>,
    pub rcpt_to: Vec<Address<'x>>,
    pub body: Cow<'x, [u8]>,
}

#[derive(Debug, Default)]
pub struct Address<'x> {
    pub email: Cow<'x, str>,
    pub parameters: Parameters<'x>,
}

#[derive(Debug, Default)]
pub struct Parameters<'x> {
    pub params: BTreeMap<Cow<'x, str>, Option<Cow<'x, str>>>,
}

impl<'x> Message<'x> {
    /// Create a new message
    pub fn new<T, U, V>(from: T, to: U, body: V) -> Self
    where
        T: Into<Address<'x>>,
        U: IntoIterator<Item = T>,
        V: Into<Cow<'x, [u8]>>,
    {
        Message {
            mail_from: from.into(),
            rcpt_to: to.into_iter().map(Into::into).collect(),
            body: body.into(),
        }
    }
}

impl<'x> From<&'x str> for Address<'x> {
    fn from(email: &'x str) -> Self {
        Address {
            email: email.into(),
            parameters: Parameters::default(),
        }
    }
}

impl<'x> From<String> for Address<'x> {
    fn from(email: String) -> Self {
        Address {
            email: email.into(),
            parameters: Parameters::default(),
        }
    }
}

impl<'x> Display for Parameters<'x> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (key, value) in &self.params {
            f.write_str(" ")?;
            f.write_str(key)?;
            if let Some(value) = value {
                f.write_str("=")?;
                f.write_str(value)?;
            }
        }
        Ok(())
    }
}

pub trait IntoMessage<'x> {
    fn into_message(self) -> crate::Result<Message<'x>>;
}

impl<'x> IntoMessage<'x> for Message<'x> {
    fn into_message(self) -> crate::Result<Message<'x>> {
        Ok(self)
    }
}

fn collect_addresses(addr: &address::Address<'_>, rcpt_to: &mut HashSet<String>) {
    match addr {
        address::Address::Address(addr) => {
            let email = addr.email.trim();
            if !email.is_empty() {
                rcpt_to.insert(email.to_string());
            }
        }
        address::Address::Group(group) => {
            for addr in &group.addresses {
                collect_addresses(addr, rcpt_to);
            }
        }
        address::Address::List(list) => {
            for addr in list {
                collect_addresses(addr, rcpt_to);
            }
        }
    }
}

impl<'x, 'y> IntoMessage<'x> for MessageBuilder<'y> {
    fn into_message(self) -> crate::Result<Message<'x>> {
        let mut mail_from = None;
        let mut rcpt_to = HashSet::new();

        for (key, value) in self.headers.iter() {
            if key.eq_ignore_ascii_case("from") {
                if let HeaderType::Address(address::Address::Address(addr)) = value {
                    let email = addr.email.trim();
                    if !email.is_empty() {
                        mail_from = email.to_string().into();
                    }
                }
            } else if key.eq_ignore_ascii_case("to")
                || key.eq_ignore_ascii_case("cc")
                || key.eq_ignore_ascii_case("bcc")
            {
                if let HeaderType::Address(addr) = value {
                    collect_addresses(addr, &mut rcpt_to);
                }
            }
        }

        if rcpt_to.is_empty() {
            return Err(crate::Error::MissingRcptTo);
        }

        Ok(Message {
            mail_from: mail_from.ok_or(crate::Error::MissingMailFrom)?.into(),
            rcpt_to: rcpt_to.into_iter().map(Address::from).collect(),
            body: self.write_to_vec()?.into(),
        })
    }
}

#[cfg(test)]
mod test {
    use mail_builder::MessageBuilder;

    use super::{IntoMessage, Parameters};

    #[test]
    fn envelope_from_headers() {
        let message = MessageBuilder::new()
            .from(("John Doe", "john@example.com"))
            .to(vec![
                ("Jane Doe", "jane@example.com"),
                ("James Smith", "james@test.com"),
            ])
            .cc("jane@example.com")
            .subject("Hi!")
            .text_body("Hello world!")
            .into_message()
            .unwrap();

        assert_eq!(message.mail_from.email, "john@example.com");
        let mut rcpt = message
            .rcpt_to
            .iter()
            .map(|a| a.email.to_string())
            .collect::<Vec<_>>();
        rcpt.sort();
        assert_eq!(rcpt, ["james@test.com", "jane@example.com"]);

        let body = String::from_utf8(message.body.into_owned()).unwrap();
        assert!(body.contains("Subject: Hi!\r\n"));
        assert!(body.contains("Hello world!"));
    }

    #[test]
    fn missing_envelope() {
        assert!(matches!(
            MessageBuilder::new()
                .from("john@example.com")
                .subject("Hi!")
                .text_body("Hello")
                .into_message(),
            Err(crate::Error::MissingRcptTo)
        ));
        assert!(matches!(
            MessageBuilder::new()
                .to("jane@example.com")
                .text_body("Hello")
                .into_message(),
            Err(crate::Error::MissingMailFrom)
        ));
    }

    #[test]
    fn parameters_display() {
        let mut params = Parameters::default();
        assert_eq!(params.to_string(), "");
        params.params.insert("SIZE".into(), Some("1024".into()));
        params.params.insert("SMTPUTF8".into(), None);
        assert_eq!(params.to_string(), " SIZE=1024 SMTPUTF8");
    }
}
