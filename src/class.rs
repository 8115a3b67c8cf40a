// Copyright 2021 Matthew Ingwersen.
//
// Licensed under the Apache License, Version 2.0 (the "License"); you
// may not use this file except in compliance with the License. You may
// obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or
// implied. See the License for the specific language governing
// permissions and limitations under the License.

//! Implementation of the [`Class`] type for DNS classes.

use crate::message::Qclass;

define_code! {
    /// Represents a class in the DNS.
    ///
    /// A class is represented on the wire as an unsigned 16-bit
    /// integer, so this is basically a wrapper around [`u16`] with
    /// constants for the defined classes. The only class in common use
    /// is [`IN`](Class::IN). (We don't include CS because it's no
    /// longer listed by the IANA.)
    pub struct Class, "CLASS" {
        IN = 1,
        CH = 3,
        HS = 4,
    }
}

impl From<Qclass> for Class {
    fn from(qclass: Qclass) -> Self {
        Self::from(u16::from(qclass))
    }
}

#[cfg(test)]
mod tests {
    use super::Class;

    #[test]
    fn displays_according_to_rfc3597() {
        // CLASS65280 is from the private use range, so it should always
        // be unknown.
        assert_eq!(Class::from(0xff00).to_string(), "CLASS65280");
        assert_eq!(Class::CH.to_string(), "CH");
    }

    #[test]
    fn parses_according_to_rfc3597() {
        let class_in: Class = "CLASS1".parse().unwrap();
        let class_65280: Class = "CLASS65280".parse().unwrap();
        assert_eq!(class_in, Class::IN);
        assert_eq!(u16::from(class_65280), 65280);
        assert_eq!("in".parse::<Class>(), Ok(Class::IN));
        assert!("XX".parse::<Class>().is_err());
    }
}
