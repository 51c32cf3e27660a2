use crate::strings::Signature;
use crate::types::ArgType;
use super::{Arg, Append, DictKey, Get, Iter, IterAppend, RefArg, Value};
use std::any;
use std::collections::HashMap;
use std::hash::Hash;

impl<T: Arg> Arg for Vec<T> {
    const ARG_TYPE: ArgType = ArgType::Array;
    fn signature() -> Signature<'static> {
        Signature::new_unchecked(format!("a{}", T::signature()))
    }
}

impl<T: Arg + Append> Append for Vec<T> {
    fn append(self, i: &mut IterAppend) {
        let sig = T::signature();
        i.append_array(&sig, |s| for x in self { s.append(x) });
    }
}

impl<'a, T: Arg + Get<'a>> Get<'a> for Vec<T> {
    fn get(i: &mut Iter<'a>) -> Option<Self> {
        let (esig, items) = match i.current()? {
            Value::Array(esig, items) => (esig, items),
            _ => return None,
        };
        // An empty array of the wrong element type is still the wrong type.
        if *esig != T::signature() { return None; }
        let mut sub = Iter::from_slice(items);
        let mut r = Vec::with_capacity(items.len());
        while sub.arg_type() != ArgType::Invalid {
            r.push(T::get(&mut sub)?);
            sub.next();
        }
        Some(r)
    }
}

impl<T: RefArg + Arg> RefArg for Vec<T> {
    fn arg_type(&self) -> ArgType { ArgType::Array }
    fn signature(&self) -> Signature<'static> {
        Signature::new_unchecked(format!("a{}", <T as Arg>::signature()))
    }
    fn append(&self, i: &mut IterAppend) {
        let sig = <T as Arg>::signature();
        i.append_array(&sig, |s| for x in self { x.append(s) });
    }
    #[inline]
    fn as_any(&self) -> &dyn any::Any where T: 'static { self }
    #[inline]
    fn as_any_mut(&mut self) -> &mut dyn any::Any where T: 'static { self }
    #[inline]
    fn as_iter<'a>(&'a self) -> Option<Box<dyn Iterator<Item=&'a dyn RefArg> + 'a>> {
        Some(Box::new(self.iter().map(|x| x as &dyn RefArg)))
    }
}

impl<K: DictKey, V: Arg> Arg for HashMap<K, V> {
    const ARG_TYPE: ArgType = ArgType::Array;
    fn signature() -> Signature<'static> {
        Signature::new_unchecked(format!("a{{{}{}}}", K::signature(), V::signature()))
    }
}

impl<K: DictKey + Append + Eq + Hash, V: Arg + Append> Append for HashMap<K, V> {
    fn append(self, i: &mut IterAppend) {
        let (ksig, vsig) = (K::signature(), V::signature());
        i.append_dict(&ksig, &vsig, |d| {
            for (k, v) in self {
                d.append_dict_entry(|e| {
                    e.append(k);
                    e.append(v);
                });
            }
        });
    }
}

impl<'a, K: DictKey + Get<'a> + Eq + Hash, V: Arg + Get<'a>> Get<'a> for HashMap<K, V> {
    fn get(i: &mut Iter<'a>) -> Option<Self> {
        let (esig, items) = match i.current()? {
            Value::Array(esig, items) => (esig, items),
            _ => return None,
        };
        let expected = format!("{{{}{}}}", K::signature(), V::signature());
        if &**esig != expected { return None; }
        let mut r = HashMap::with_capacity(items.len());
        for entry in items {
            let pair = match entry {
                Value::DictEntry(pair) => pair,
                _ => return None,
            };
            let k = K::get(&mut Iter::from_slice(std::slice::from_ref(&pair[0])))?;
            let v = V::get(&mut Iter::from_slice(std::slice::from_ref(&pair[1])))?;
            // Wire-level duplicates collapse here, last entry wins.
            r.insert(k, v);
        }
        Some(r)
    }
}

impl<K, V> RefArg for HashMap<K, V>
where K: DictKey + RefArg + Eq + Hash, V: Arg + RefArg {
    fn arg_type(&self) -> ArgType { ArgType::Array }
    fn signature(&self) -> Signature<'static> {
        Signature::new_unchecked(format!("a{{{}{}}}",
            <K as Arg>::signature(), <V as Arg>::signature()))
    }
    fn append(&self, i: &mut IterAppend) {
        let (ksig, vsig) = (<K as Arg>::signature(), <V as Arg>::signature());
        i.append_dict(&ksig, &vsig, |d| {
            for (k, v) in self {
                d.append_dict_entry(|e| {
                    k.append(e);
                    v.append(e);
                });
            }
        });
    }
    #[inline]
    fn as_any(&self) -> &dyn any::Any where Self: 'static { self }
    #[inline]
    fn as_any_mut(&mut self) -> &mut dyn any::Any where Self: 'static { self }
    #[inline]
    fn as_iter<'a>(&'a self) -> Option<Box<dyn Iterator<Item=&'a dyn RefArg> + 'a>> {
        Some(Box::new(self.iter().flat_map(|(k, v)| {
            std::iter::once(k as &dyn RefArg).chain(std::iter::once(v as &dyn RefArg))
        })))
    }
}
