use std::{
    cell::{Ref, RefCell, RefMut},
    rc::Rc,
    sync::{Arc, Mutex, MutexGuard},
};

// TbObj allows mutably sharing test objects (scoreboard, coverage db, operand
// lists, ...) between tasks. Since the simulation is single threaded, we can
// use Rc, RefCell, which are not Send + Sync, without worrying.
pub struct TbObj<T>(Rc<RefCell<T>>);

impl<T> TbObj<T> {
    pub fn new(data: T) -> TbObj<T> {
        TbObj(Rc::new(RefCell::new(data)))
    }
    pub fn get(&self) -> Ref<T> {
        (*self.0).borrow()
    }
    pub fn get_mut(&self) -> RefMut<T> {
        (*self.0).borrow_mut()
    }
    pub fn with_mut<R>(&self, f: impl FnOnce(RefMut<T>) -> R) -> R {
        f((*self.0).borrow_mut())
    }
}

impl<T> Clone for TbObj<T> {
    fn clone(&self) -> Self {
        TbObj(self.0.clone())
    }
}

// Rc is neither Send nor Sync but in this context its safe. We save some overhead.
unsafe impl<T> Send for TbObj<T> {}
unsafe impl<T> Sync for TbObj<T> {}

// safe implementation, used for framework statics which outlive a single run
pub struct TbObjSafe<T>(Arc<Mutex<T>>);

impl<T> TbObjSafe<T> {
    pub fn new(data: T) -> TbObjSafe<T> {
        TbObjSafe(Arc::new(Mutex::new(data)))
    }
    pub fn get(&self) -> MutexGuard<T> {
        (*self.0).lock().unwrap_or_else(|p| p.into_inner())
    }
    pub fn get_mut(&self) -> MutexGuard<T> {
        self.get()
    }
    pub fn with_mut<R>(&self, f: impl FnOnce(MutexGuard<T>) -> R) -> R {
        f(self.get())
    }
}

impl<T> Clone for TbObjSafe<T> {
    fn clone(&self) -> Self {
        TbObjSafe(self.0.clone())
    }
}
